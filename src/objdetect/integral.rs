use crate::core::{Mat, MatDepth};
use crate::core::types::Rect;
use crate::error::{Error, Result};

/// Summed-area tables bound to one grayscale image at one pyramid scale.
///
/// `sum` and `sqsum` have dimensions `(rows+1, cols+1)` with a zeroed
/// row/column 0, exactly the layout `HaarEvaluator`/`LBPEvaluator` index
/// into. `tilted` (the 45°-rotated variant) is only built when at least
/// one loaded Haar feature needs it.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    rows: usize,
    cols: usize,
    sum: Vec<i32>,
    sqsum: Vec<f64>,
    tilted: Option<Vec<i32>>,
}

impl IntegralImage {
    /// Build from a single-channel `U8` image. `rows`/`cols` below refer
    /// to the integral image's own dimensions (`image.rows()+1`,
    /// `image.cols()+1`); `stride()` returns `cols`.
    pub fn build(image: &Mat, need_tilted: bool) -> Result<Self> {
        if image.channels() != 1 || image.depth() != MatDepth::U8 {
            return Err(Error::InvalidParameter(
                "integral image requires a single-channel U8 image".to_string(),
            ));
        }

        let src_rows = image.rows();
        let src_cols = image.cols();
        let rows = src_rows + 1;
        let cols = src_cols + 1;

        let mut sum = vec![0i32; rows * cols];
        let mut sqsum = vec![0f64; rows * cols];

        for y in 0..src_rows {
            for x in 0..src_cols {
                let pixel = i32::from(image.at(y, x)?[0]);
                let above = sum[y * cols + (x + 1)];
                let left = sum[(y + 1) * cols + x];
                let above_left = sum[y * cols + x];
                sum[(y + 1) * cols + (x + 1)] = pixel + above + left - above_left;

                let pixel_sq = f64::from(pixel) * f64::from(pixel);
                let above_sq = sqsum[y * cols + (x + 1)];
                let left_sq = sqsum[(y + 1) * cols + x];
                let above_left_sq = sqsum[y * cols + x];
                sqsum[(y + 1) * cols + (x + 1)] = pixel_sq + above_sq + left_sq - above_left_sq;
            }
        }

        let tilted = if need_tilted {
            Some(build_tilted(image, rows, cols)?)
        } else {
            None
        };

        Ok(Self {
            rows,
            cols,
            sum,
            sqsum,
            tilted,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn sum(&self) -> &[i32] {
        &self.sum
    }

    #[must_use]
    pub fn sqsum(&self) -> &[f64] {
        &self.sqsum
    }

    #[must_use]
    pub fn tilted(&self) -> Option<&[i32]> {
        self.tilted.as_deref()
    }

    #[must_use]
    pub fn has_tilted(&self) -> bool {
        self.tilted.is_some()
    }
}

/// The 4 sub-rectangle corner offsets into an integral image's flat
/// buffer. Offsets are signed because tilted corners can reach to the
/// left of the rectangle's own origin column.
pub type IntegralPtrs = [isize; 4];

/// Upright rectangle sum offsets: `p0=(x,y) p1=(x+w,y) p2=(x,y+h) p3=(x+w,y+h)`.
#[must_use]
pub fn rect_ptrs(rect: Rect, step: usize) -> IntegralPtrs {
    let step = step as isize;
    let (x, y, w, h) = (rect.x as isize, rect.y as isize, rect.width as isize, rect.height as isize);
    [
        x + step * y,
        x + w + step * y,
        x + step * (y + h),
        x + w + step * (y + h),
    ]
}

/// Tilted (45°) rectangle sum offsets.
#[must_use]
pub fn tilted_ptrs(rect: Rect, step: usize) -> IntegralPtrs {
    let step = step as isize;
    let (x, y, w, h) = (rect.x as isize, rect.y as isize, rect.width as isize, rect.height as isize);
    [
        x + step * y,
        x - h + step * (y + h),
        x + w + step * (y + w),
        x + w - h + step * (y + w + h),
    ]
}

/// Evaluate `S[p0+w] - S[p1+w] - S[p2+w] + S[p3+w]` for a window offset `w`.
#[must_use]
pub fn calc_sum(buf: &[i32], ptrs: &IntegralPtrs, window_offset: isize) -> i32 {
    buf[(ptrs[0] + window_offset) as usize]
        - buf[(ptrs[1] + window_offset) as usize]
        - buf[(ptrs[2] + window_offset) as usize]
        + buf[(ptrs[3] + window_offset) as usize]
}

/// Same as [`calc_sum`] for the `f64` square-sum table.
#[must_use]
pub fn calc_sqsum(buf: &[f64], ptrs: &IntegralPtrs, window_offset: isize) -> f64 {
    buf[(ptrs[0] + window_offset) as usize]
        - buf[(ptrs[1] + window_offset) as usize]
        - buf[(ptrs[2] + window_offset) as usize]
        + buf[(ptrs[3] + window_offset) as usize]
}

/// Build the rotated (tilted) integral image.
///
/// `tilted[Y][X]` is defined as the sum of every pixel `(px, py)` with
/// `px + py < X + Y` and `px - py >= X - Y` — i.e. the pixels inside the
/// 45°-rotated triangle opening upward from grid corner `(X, Y)`, which is
/// exactly what [`tilted_ptrs`]'s four-corner inclusion-exclusion needs.
/// Substituting diagonal coordinates `a = px+py`, `b = px-py` turns this
/// into an ordinary 2D prefix sum over `(a, b)` buckets, computed here in
/// `O(rows*cols)`.
fn build_tilted(image: &Mat, rows: usize, cols: usize) -> Result<Vec<i32>> {
    let src_rows = rows - 1;
    let src_cols = cols - 1;

    // number of distinct values of a=px+py and b=px-py across the image
    let na = src_rows + src_cols - 1.max(if src_rows == 0 || src_cols == 0 { 1 } else { 0 });
    let na = na.max(1);
    let nb = na;
    let b_offset = src_rows.saturating_sub(1) as isize;

    let mut grid = vec![0i64; na * nb];
    for py in 0..src_rows {
        for px in 0..src_cols {
            let a = px + py;
            let b = px as isize - py as isize + b_offset;
            if a < na && b >= 0 && (b as usize) < nb {
                grid[a * nb + b as usize] += i64::from(image.at(py, px)?[0]);
            }
        }
    }

    // PS(a,b) = sum over a'<=a, b'>=b
    let mut ps = vec![0i64; na * nb];
    for a in 0..na {
        for b in (0..nb).rev() {
            let here = grid[a * nb + b];
            let from_a = if a > 0 { ps[(a - 1) * nb + b] } else { 0 };
            let from_b = if b + 1 < nb { ps[a * nb + b + 1] } else { 0 };
            let from_both = if a > 0 && b + 1 < nb { ps[(a - 1) * nb + b + 1] } else { 0 };
            ps[a * nb + b] = here + from_a + from_b - from_both;
        }
    }

    let query = |x: isize, y: isize| -> i32 {
        let a_idx = x + y - 1;
        if a_idx < 0 {
            return 0;
        }
        let b_idx = x - y + b_offset;
        if b_idx >= nb as isize {
            return 0;
        }
        let a_idx = (a_idx as usize).min(na - 1);
        let b_idx = b_idx.max(0) as usize;
        ps[a_idx * nb + b_idx] as i32
    };

    let mut tilted = vec![0i32; rows * cols];
    for y in 0..rows {
        for x in 0..cols {
            tilted[y * cols + x] = query(x as isize, y as isize);
        }
    }
    Ok(tilted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    fn naive_upright_sum(image: &Mat, r: Rect) -> i64 {
        let mut total = 0i64;
        for y in r.y..r.y + r.height {
            for x in r.x..r.x + r.width {
                total += i64::from(image.at(y as usize, x as usize).unwrap()[0]);
            }
        }
        total
    }

    #[test]
    fn test_integral_row0_col0_zero() {
        let img = Mat::new_with_default(5, 5, 1, MatDepth::U8, Scalar::all(3.0)).unwrap();
        let integral = IntegralImage::build(&img, false).unwrap();
        for x in 0..integral.cols() {
            assert_eq!(integral.sum()[x], 0);
        }
        for y in 0..integral.rows() {
            assert_eq!(integral.sum()[y * integral.stride()], 0);
        }
    }

    #[test]
    fn test_upright_rect_sum_matches_naive() {
        let mut img = Mat::new(6, 6, 1, MatDepth::U8).unwrap();
        let mut v = 1u8;
        for y in 0..6 {
            for x in 0..6 {
                img.at_mut(y, x).unwrap()[0] = v;
                v = v.wrapping_add(1);
            }
        }
        let integral = IntegralImage::build(&img, false).unwrap();
        let rect = Rect::new(1, 2, 3, 2);
        let ptrs = rect_ptrs(rect, integral.stride());
        let got = calc_sum(integral.sum(), &ptrs, 0);
        assert_eq!(i64::from(got), naive_upright_sum(&img, rect));
    }

    #[test]
    fn test_tilted_diamond_matches_geometric_definition() {
        // brute-force reference: T(X,Y) = sum of img(px,py) with px+py<X+Y and px-py>=X-Y
        let img = {
            let mut m = Mat::new(4, 4, 1, MatDepth::U8).unwrap();
            let mut v = 1u8;
            for y in 0..4 {
                for x in 0..4 {
                    m.at_mut(y, x).unwrap()[0] = v;
                    v = v.wrapping_add(3);
                }
            }
            m
        };
        let integral = IntegralImage::build(&img, true).unwrap();
        let tilted = integral.tilted().unwrap();
        let stride = integral.stride();

        for y in 0..integral.rows() {
            for x in 0..integral.cols() {
                let mut expected = 0i64;
                for py in 0..4usize {
                    for px in 0..4usize {
                        let a = px as i64 + py as i64;
                        let b = px as i64 - py as i64;
                        if a < (x as i64 + y as i64) && b >= (x as i64 - y as i64) {
                            expected += i64::from(img.at(py, px).unwrap()[0]);
                        }
                    }
                }
                assert_eq!(i64::from(tilted[y * stride + x]), expected, "at ({x},{y})");
            }
        }
    }
}
