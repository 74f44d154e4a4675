use crate::core::types::{Point, Rect, Size};
use crate::core::{Mat, MatDepth};
use crate::error::{Error, Result};
use crate::objdetect::integral::{calc_sum, IntegralImage};

/// Order in which the 8 neighbor blocks are visited: clockwise from the
/// top-left, which contributes the most significant bit.
const NEIGHBOR_ORDER: [(usize, usize); 8] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 2),
    (2, 2),
    (2, 1),
    (2, 0),
    (1, 0),
];

/// A block-LBP feature: a 3x3 tiling of equal-sized blocks, anchored at
/// `rect`'s origin with `rect.width`/`rect.height` as the block size.
#[derive(Debug, Clone, Copy)]
pub struct LBPFeature {
    pub rect: Rect,
}

impl LBPFeature {
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

#[derive(Debug, Clone, Copy)]
struct RuntimeFeature {
    rect: Rect,
    /// pixel offsets of the 4x4 grid of block corners, row-major
    grid: [isize; 16],
}

/// Binds a set of LBP features to one integral image at one pyramid scale.
#[derive(Debug, Clone)]
pub struct LBPEvaluator {
    features: Vec<RuntimeFeature>,
    orig_win_size: Size,
    stride: usize,
    sum: Vec<i32>,
}

impl LBPEvaluator {
    pub fn new(features: &[LBPFeature], orig_win_size: Size) -> Self {
        Self {
            features: features
                .iter()
                .map(|f| RuntimeFeature { rect: f.rect, grid: [0; 16] })
                .collect(),
            orig_win_size,
            stride: 0,
            sum: Vec::new(),
        }
    }

    /// Build the (upright-only) integral image and rebase every feature's
    /// 16 grid-corner offsets against it.
    pub fn set_image(&mut self, image: &Mat) -> Result<bool> {
        if image.depth() != MatDepth::U8 || image.channels() != 1 {
            return Err(Error::InvalidParameter(
                "LBPEvaluator::set_image requires a single-channel U8 image".to_string(),
            ));
        }

        if (image.rows() as i32) < self.orig_win_size.height || (image.cols() as i32) < self.orig_win_size.width {
            return Ok(false);
        }

        let integral = IntegralImage::build(image, false)?;
        let stride = integral.stride() as isize;

        for runtime in &mut self.features {
            let rect = runtime.rect;
            let mut grid = [0isize; 16];
            for row in 0..4 {
                for col in 0..4 {
                    let x = rect.x as isize + col as isize * rect.width as isize;
                    let y = rect.y as isize + row as isize * rect.height as isize;
                    grid[row * 4 + col] = x + stride * y;
                }
            }
            runtime.grid = grid;
        }

        self.stride = integral.stride();
        self.sum = integral.sum().to_vec();
        Ok(true)
    }

    pub fn set_window(&self, pt: Point) -> Option<isize> {
        let cols = self.stride as i32;
        let rows = (self.sum.len() / self.stride.max(1)) as i32;

        if pt.x < 0
            || pt.y < 0
            || pt.x + self.orig_win_size.width >= cols - 2
            || pt.y + self.orig_win_size.height >= rows - 2
        {
            return None;
        }

        Some(pt.y as isize * self.stride as isize + pt.x as isize)
    }

    fn block_sum(&self, grid: &[isize; 16], row: usize, col: usize, w: isize) -> i32 {
        let tl = grid[row * 4 + col] + w;
        let tr = grid[row * 4 + col + 1] + w;
        let bl = grid[(row + 1) * 4 + col] + w;
        let br = grid[(row + 1) * 4 + col + 1] + w;
        self.sum[tl as usize] - self.sum[tr as usize] - self.sum[bl as usize] + self.sum[br as usize]
    }

    /// 8-bit LBP category for the window at offset `w`: one bit per
    /// neighbor block, set when the neighbor is brighter than the center.
    pub fn evaluate(&self, feature_idx: usize, w: isize) -> u8 {
        let grid = &self.features[feature_idx].grid;
        let center = self.block_sum(grid, 1, 1, w);

        let mut category = 0u8;
        for (i, &(row, col)) in NEIGHBOR_ORDER.iter().enumerate() {
            let bit = 7 - i;
            if self.block_sum(grid, row, col, w) >= center {
                category |= 1 << bit;
            }
        }
        category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    #[test]
    fn test_constant_image_yields_category_255() {
        // every neighbor sum equals the center sum, so every ">=" comparison is true
        let feature = LBPFeature::new(Rect::new(0, 0, 8, 8));
        let mut lbp = LBPEvaluator::new(&[feature], Size::new(24, 24));
        let image = Mat::new_with_default(64, 64, 1, MatDepth::U8, Scalar::all(50.0)).unwrap();
        assert!(lbp.set_image(&image).unwrap());
        let w = lbp.set_window(Point::new(0, 0)).unwrap();
        assert_eq!(lbp.evaluate(0, w), 0xFF);
    }

    #[test]
    fn test_bright_center_block_yields_category_zero() {
        let block = 8usize;
        let mut image = Mat::new_with_default(64, 64, 1, MatDepth::U8, Scalar::all(10.0)).unwrap();
        for y in block..2 * block {
            for x in block..2 * block {
                image.at_mut(y, x).unwrap()[0] = 200;
            }
        }
        let feature = LBPFeature::new(Rect::new(0, 0, block as i32, block as i32));
        let mut lbp = LBPEvaluator::new(&[feature], Size::new(24, 24));
        assert!(lbp.set_image(&image).unwrap());
        let w = lbp.set_window(Point::new(0, 0)).unwrap();
        assert_eq!(lbp.evaluate(0, w), 0);
    }

    #[test]
    fn test_category_is_always_in_range() {
        let feature = LBPFeature::new(Rect::new(0, 0, 5, 5));
        let mut lbp = LBPEvaluator::new(&[feature], Size::new(20, 20));
        let image = Mat::new_with_default(40, 40, 1, MatDepth::U8, Scalar::all(77.0)).unwrap();
        assert!(lbp.set_image(&image).unwrap());
        let w = lbp.set_window(Point::new(3, 3)).unwrap();
        let category = lbp.evaluate(0, w);
        assert!(category <= 255);
    }
}
