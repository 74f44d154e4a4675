pub mod mat;
pub mod types;

pub use mat::{Mat, MatDepth};
pub use types::*;
