pub mod cascade;
pub mod evaluator;
pub mod group;
pub mod haar;
pub mod integral;
pub mod lbp;
pub mod model;

pub use cascade::{CascadeClassifier, DetectParams};
pub use evaluator::{run_at, FeatureEvaluator};
pub use group::group_rectangles;
pub use haar::{HaarEvaluator, HaarFeature, HaarRect};
pub use integral::{rect_ptrs, tilted_ptrs, IntegralImage, IntegralPtrs};
pub use lbp::{LBPEvaluator, LBPFeature};
pub use model::{load_cascade, Cascade, DTree, DTreeNode, FeatureType, Features, ModelNode, Stage};
