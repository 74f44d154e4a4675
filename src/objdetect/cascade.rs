use crate::core::types::{Point, Rect, Size};
use crate::core::Mat;
use crate::error::Result;
use crate::imgproc::geometric::resize_bilinear;
use crate::objdetect::evaluator::{run_at, FeatureEvaluator};
use crate::objdetect::group::group_rectangles;
use crate::objdetect::model::{load_cascade, Cascade, ModelNode};

/// Pyramid growth factor and grouping parameters for [`CascadeClassifier::detect_multi_scale`].
#[derive(Debug, Clone, Copy)]
pub struct DetectParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: Option<Size>,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: None,
        }
    }
}

/// Public multi-scale detector surface. Holds an optional loaded
/// [`Cascade`]; an unloaded classifier always detects nothing, never
/// errors.
#[derive(Debug, Clone, Default)]
pub struct CascadeClassifier {
    cascade: Option<Cascade>,
}

impl CascadeClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self { cascade: None }
    }

    /// Load a cascade from an already-decoded node tree. Callers that want
    /// a "load → bool" calling convention can match on `.is_ok()`.
    pub fn load(&mut self, root: &ModelNode) -> Result<()> {
        self.cascade = Some(load_cascade(root)?);
        Ok(())
    }

    #[must_use]
    pub fn empty(&self) -> bool {
        self.cascade.is_none()
    }

    /// Run the multi-scale pyramid and return grouped detections in
    /// original-image coordinates.
    pub fn detect_multi_scale(&self, image: &Mat, params: DetectParams) -> Result<Vec<Rect>> {
        let Some(cascade) = &self.cascade else {
            return Ok(Vec::new());
        };
        validate_scale_factor(params.scale_factor)?;

        let min_size = params.min_size.unwrap_or(cascade.orig_win_size);
        let mut evaluator = FeatureEvaluator::new(cascade);
        let mut raw = Vec::new();

        for plan in ScalePlan::iter(image, cascade, min_size, params.scale_factor) {
            let scaled = resize_bilinear(image, plan.scaled_size)?;
            if !evaluator.set_image(&scaled)? {
                break;
            }
            raw.extend(scan_scale(cascade, &mut evaluator, &plan));
        }

        Ok(group_rectangles(&raw, params.min_neighbors))
    }

    /// Scale-parallel variant of [`Self::detect_multi_scale`]: each pyramid
    /// level gets its own evaluator clone and runs independently, so a
    /// level whose image turns out too small for the cascade (rare, since
    /// [`ScalePlan::iter`] already filters on size) simply contributes no
    /// candidates instead of aborting the whole pyramid.
    #[cfg(feature = "rayon")]
    pub fn detect_multi_scale_parallel(&self, image: &Mat, params: DetectParams) -> Result<Vec<Rect>> {
        use rayon::prelude::*;

        let Some(cascade) = &self.cascade else {
            return Ok(Vec::new());
        };
        validate_scale_factor(params.scale_factor)?;

        let min_size = params.min_size.unwrap_or(cascade.orig_win_size);
        let plans: Vec<ScalePlan> = ScalePlan::iter(image, cascade, min_size, params.scale_factor).collect();

        let per_scale: Result<Vec<Vec<Rect>>> = plans
            .par_iter()
            .map(|plan| {
                let scaled = resize_bilinear(image, plan.scaled_size)?;
                let mut evaluator = FeatureEvaluator::new(cascade);
                if !evaluator.set_image(&scaled)? {
                    return Ok(Vec::new());
                }
                Ok(scan_scale(cascade, &mut evaluator, plan))
            })
            .collect();

        let raw: Vec<Rect> = per_scale?.into_iter().flatten().collect();
        Ok(group_rectangles(&raw, params.min_neighbors))
    }
}

fn validate_scale_factor(scale_factor: f64) -> Result<()> {
    if scale_factor <= 1.0 {
        return Err(crate::error::Error::InvalidParameter(
            "scale_factor must be > 1".to_string(),
        ));
    }
    Ok(())
}

/// One pyramid level's geometry, computed without touching pixel data.
struct ScalePlan {
    scale: f64,
    win: Size,
    scaled_size: Size,
    sz1: (i32, i32),
}

impl ScalePlan {
    /// Enumerate every scale the pyramid will visit, in ascending order,
    /// applying the same `sz1`/`min_size` filters as the sequential driver
    /// so parallel and sequential detection see the same scale set.
    fn iter(image: &Mat, cascade: &Cascade, min_size: Size, scale_factor: f64) -> impl Iterator<Item = ScalePlan> + '_ {
        let cols = image.cols() as i32;
        let rows = image.rows() as i32;
        let orig = cascade.orig_win_size;

        std::iter::successors(Some(1.0f64), move |&scale| Some(scale * scale_factor))
            .map(move |scale| {
                let win = Size::new(
                    (f64::from(orig.width) * scale).round() as i32,
                    (f64::from(orig.height) * scale).round() as i32,
                );
                let scaled_size = Size::new(
                    (f64::from(cols) / scale).round() as i32,
                    (f64::from(rows) / scale).round() as i32,
                );
                let sz1 = (scaled_size.width - orig.width, scaled_size.height - orig.height);
                ScalePlan { scale, win, scaled_size, sz1 }
            })
            .take_while(|plan| plan.sz1.0 > 0 && plan.sz1.1 > 0)
            .filter(move |plan| plan.win.width >= min_size.width && plan.win.height >= min_size.height)
    }
}

fn scan_scale(cascade: &Cascade, evaluator: &mut FeatureEvaluator, plan: &ScalePlan) -> Vec<Rect> {
    let y_step: i32 = if plan.scale > 2.0 { 1 } else { 2 };
    let mut raw = Vec::new();

    let mut y = 0;
    while y < plan.sz1.1 {
        let mut x = 0;
        while x < plan.sz1.0 {
            let result = run_at(cascade, evaluator, Point::new(x, y));
            if result > 0 {
                raw.push(Rect::new(
                    (f64::from(x) * plan.scale).round() as i32,
                    (f64::from(y) * plan.scale).round() as i32,
                    plan.win.width,
                    plan.win.height,
                ));
            } else if result == 0 {
                // stage-0 rejection: advance an extra step
                x += y_step;
            }
            x += y_step;
        }
        y += y_step;
    }

    raw
}
