use crate::core::types::{Point, Rect, Size};
use crate::core::{Mat, MatDepth};
use crate::error::{Error, Result};
use crate::objdetect::integral::{calc_sqsum, calc_sum, rect_ptrs, tilted_ptrs, IntegralImage, IntegralPtrs};

/// One weighted sub-rectangle of a Haar feature. A feature uses 1-3 of
/// these; unused slots carry `weight == 0.0` and are skipped at evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaarRect {
    pub rect: Rect,
    pub weight: f32,
}

impl HaarRect {
    #[must_use]
    pub fn new(rect: Rect, weight: f32) -> Self {
        Self { rect, weight }
    }
}

/// A 2-3 rectangle Haar-like feature, as loaded from the model.
#[derive(Debug, Clone)]
pub struct HaarFeature {
    pub tilted: bool,
    pub rects: Vec<HaarRect>,
}

impl HaarFeature {
    #[must_use]
    pub fn new(tilted: bool, rects: Vec<HaarRect>) -> Self {
        Self { tilted, rects }
    }
}

#[derive(Debug, Clone)]
struct RuntimeFeature {
    tilted: bool,
    weights: Vec<f32>,
    ptrs: Vec<IntegralPtrs>,
    rects: Vec<Rect>,
}

/// Binds a set of Haar features to one integral image at one pyramid scale
/// and evaluates them window by window.
#[derive(Debug, Clone)]
pub struct HaarEvaluator {
    features: Vec<RuntimeFeature>,
    orig_win_size: Size,
    stride: usize,
    sum: Vec<i32>,
    sqsum: Vec<f64>,
    tilted: Option<Vec<i32>>,
    normrect_area: i32,
    normrect_ptrs: IntegralPtrs,
    norm: f32,
}

impl HaarEvaluator {
    pub fn new(features: &[HaarFeature], orig_win_size: Size) -> Self {
        let features = features
            .iter()
            .map(|f| RuntimeFeature {
                tilted: f.tilted,
                weights: f.rects.iter().map(|r| r.weight).collect(),
                rects: f.rects.iter().map(|r| r.rect).collect(),
                ptrs: vec![[0; 4]; f.rects.len()],
            })
            .collect();

        Self {
            features,
            orig_win_size,
            stride: 0,
            sum: Vec::new(),
            sqsum: Vec::new(),
            tilted: None,
            normrect_area: 0,
            normrect_ptrs: [0; 4],
            norm: 1.0,
        }
    }

    #[must_use]
    pub fn needs_tilted(&self) -> bool {
        self.features.iter().any(|f| f.tilted)
    }

    /// Build the integral image for `image` and rebase every feature's
    /// sub-rectangle offsets against it. `Ok(false)` means `image` is
    /// smaller than `orig_win_size` — the pyramid ends cleanly, not an
    /// error.
    pub fn set_image(&mut self, image: &Mat) -> Result<bool> {
        if image.depth() != MatDepth::U8 || image.channels() != 1 {
            return Err(Error::InvalidParameter(
                "HaarEvaluator::set_image requires a single-channel U8 image".to_string(),
            ));
        }

        if (image.rows() as i32) < self.orig_win_size.height || (image.cols() as i32) < self.orig_win_size.width {
            return Ok(false);
        }

        let integral = IntegralImage::build(image, self.needs_tilted())?;
        let stride = integral.stride();

        for feature in &mut self.features {
            for (i, rect) in feature.rects.iter().enumerate() {
                feature.ptrs[i] = if feature.tilted {
                    tilted_ptrs(*rect, stride)
                } else {
                    rect_ptrs(*rect, stride)
                };
            }
        }

        let normrect = Rect::new(1, 1, self.orig_win_size.width - 2, self.orig_win_size.height - 2);
        self.normrect_area = normrect.area();
        self.normrect_ptrs = rect_ptrs(normrect, stride);
        self.stride = stride;
        self.sum = integral.sum().to_vec();
        self.sqsum = integral.sqsum().to_vec();
        self.tilted = integral.tilted().map(<[i32]>::to_vec);

        Ok(true)
    }

    /// Bounds-checks a window origin and computes the variance-normalization
    /// factor, returning the pixel offset to feed into [`Self::evaluate`].
    /// `None` means the window is rejected.
    pub fn set_window(&mut self, pt: Point) -> Option<isize> {
        let cols = self.stride as i32;
        let rows = (self.sum.len() / self.stride.max(1)) as i32;

        if pt.x < 0
            || pt.y < 0
            || pt.x + self.orig_win_size.width >= cols - 2
            || pt.y + self.orig_win_size.height >= rows - 2
        {
            return None;
        }

        let w = pt.y as isize * self.stride as isize + pt.x as isize;
        let valsum = calc_sum(&self.sum, &self.normrect_ptrs, w);
        let valsqsum = calc_sqsum(&self.sqsum, &self.normrect_ptrs, w);

        let area = f64::from(self.normrect_area);
        let var = area * valsqsum - f64::from(valsum) * f64::from(valsum);
        self.norm = if var > 0.0 { (1.0 / var.sqrt()) as f32 } else { 1.0 };

        Some(w)
    }

    /// Current variance-normalization factor, valid since the last
    /// [`Self::set_window`] call.
    #[must_use]
    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Weighted rectangle-sum response for one feature at window offset `w`,
    /// normalized by the variance factor from the last `set_window` call.
    pub fn evaluate(&self, feature_idx: usize, w: isize) -> f32 {
        let feature = &self.features[feature_idx];
        let buf: &[i32] = if feature.tilted {
            self.tilted.as_deref().unwrap_or(&self.sum)
        } else {
            &self.sum
        };

        let mut value = 0.0f32;
        for (i, &weight) in feature.weights.iter().enumerate() {
            if weight == 0.0 {
                continue;
            }
            value += weight * calc_sum(buf, &feature.ptrs[i], w) as f32;
        }
        value * self.norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    fn solid_image(size: i32, value: f64) -> Mat {
        Mat::new_with_default(size as usize, size as usize, 1, MatDepth::U8, Scalar::all(value)).unwrap()
    }

    #[test]
    fn test_constant_image_gives_zero_variance_and_unit_norm() {
        let mut haar = HaarEvaluator::new(&[], Size::new(24, 24));
        let image = solid_image(64, 128.0);
        assert!(haar.set_image(&image).unwrap());
        let w = haar.set_window(Point::new(0, 0)).expect("window should be accepted");
        assert!(w >= 0);
        assert_eq!(haar.norm(), 1.0);
    }

    #[test]
    fn test_set_window_rejects_out_of_bounds() {
        let mut haar = HaarEvaluator::new(&[], Size::new(24, 24));
        let image = solid_image(24, 10.0);
        assert!(haar.set_image(&image).unwrap());
        assert!(haar.set_window(Point::new(-1, 0)).is_none());
        assert!(haar.set_window(Point::new(0, 0)).is_none(), "24x24 image has no valid window for a 24x24 model");
    }

    #[test]
    fn test_set_image_reports_image_too_small() {
        let mut haar = HaarEvaluator::new(&[], Size::new(24, 24));
        let image = solid_image(10, 1.0);
        assert!(!haar.set_image(&image).unwrap());
    }

    /// The tilted evaluation of a feature over a checkerboard must match the
    /// untilted evaluation of the same rectangle's pixels reindexed onto a
    /// 45°-rotated grid: substituting `a = row+col`, `b = col-row` and laying
    /// the result out as an upright block is exactly what rotating the
    /// checkerboard by 45° and resampling onto the pixel grid would produce,
    /// with no interpolation loss since the diagonal substitution is a
    /// bijection on integer coordinates of matching parity.
    #[test]
    fn test_tilted_feature_matches_untilted_feature_on_rotated_checkerboard() {
        let mut img = Mat::new(8, 8, 1, MatDepth::U8).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                let v: u8 = if (row + col) % 2 == 0 { 200 } else { 50 };
                img.at_mut(row, col).unwrap()[0] = v;
            }
        }

        // Reindex the checkerboard's diagonal coordinates (a = col+row,
        // b = col-row) onto an upright grid: a in [2,6), b in [-2,2),
        // offset so (a,b) = (2,-2) lands at (row,col) = (0,0). Cells whose
        // (a,b) have mismatched parity have no corresponding pixel and stay 0.
        let mut rotated = Mat::new(6, 6, 1, MatDepth::U8).unwrap();
        for a in 2..6i32 {
            for b in -2..2i32 {
                if (a + b) % 2 != 0 {
                    continue;
                }
                let col = (a + b) / 2;
                let row = (a - b) / 2;
                let v = img.at(row as usize, col as usize).unwrap()[0];
                rotated.at_mut((a - 2) as usize, (b + 2) as usize).unwrap()[0] = v;
            }
        }

        let tilted_feature = HaarFeature::new(true, vec![HaarRect::new(Rect::new(2, 0, 2, 2), 1.0)]);
        let mut tilted_eval = HaarEvaluator::new(&[tilted_feature], Size::new(6, 6));
        assert!(tilted_eval.set_image(&img).unwrap());
        let w = tilted_eval.set_window(Point::new(0, 0)).unwrap();
        let tilted_raw = tilted_eval.evaluate(0, w) / tilted_eval.norm();

        let untilted_feature = HaarFeature::new(false, vec![HaarRect::new(Rect::new(0, 0, 4, 4), 1.0)]);
        let mut untilted_eval = HaarEvaluator::new(&[untilted_feature], Size::new(4, 4));
        assert!(untilted_eval.set_image(&rotated).unwrap());
        let w2 = untilted_eval.set_window(Point::new(0, 0)).unwrap();
        let untilted_raw = untilted_eval.evaluate(0, w2) / untilted_eval.norm();

        assert!(
            (tilted_raw - untilted_raw).abs() < 1e-3,
            "tilted={tilted_raw} untilted={untilted_raw}"
        );
    }

    #[test]
    fn test_two_rect_feature_zero_mean_on_constant_image() {
        let feature = HaarFeature::new(
            false,
            vec![
                HaarRect::new(Rect::new(0, 0, 24, 12), 1.0),
                HaarRect::new(Rect::new(0, 12, 24, 12), -1.0),
            ],
        );
        let mut haar = HaarEvaluator::new(&[feature], Size::new(24, 24));
        let image = solid_image(64, 200.0);
        assert!(haar.set_image(&image).unwrap());
        let w = haar.set_window(Point::new(0, 0)).unwrap();
        assert_eq!(haar.evaluate(0, w), 0.0);
    }
}
