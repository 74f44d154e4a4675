//! # cascade-detect
//!
//! A pure Rust multi-scale object detector driven by a boosted cascade of
//! decision-tree classifiers over integral-image features (Haar-like
//! rectangle sums and Local Binary Pattern blocks).
//!
//! ## Features
//!
//! - **Core**: Basic data structures (`Mat`, `Point`, `Size`, `Rect`, `Scalar`)
//! - **Image processing**: grayscale conversion, bilinear resizing
//! - **Object detection**: integral images, Haar/LBP feature evaluators,
//!   cascade evaluation, the multi-scale pyramid driver and rectangle
//!   grouping
//!
//! ## Example
//!
//! ```rust,no_run
//! use cascade_detect::prelude::*;
//! use cascade_detect::objdetect::ModelNode;
//!
//! # fn main() -> cascade_detect::error::Result<()> {
//! let model: ModelNode = unimplemented!("decoded elsewhere, out of scope for this crate");
//! let mut classifier = CascadeClassifier::new();
//! classifier.load(&model)?;
//!
//! let image = Mat::new(480, 640, 1, MatDepth::U8)?;
//! let faces = classifier.detect_multi_scale(&image, DetectParams::default())?;
//! # let _ = faces;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod imgproc;
pub mod objdetect;

pub mod prelude {
    //! Convenience module that re-exports commonly used items
    pub use crate::core::{Mat, MatDepth, Point, Rect, Scalar, Size};
    pub use crate::error::{Error, Result};
    pub use crate::objdetect::{CascadeClassifier, DetectParams};
}
