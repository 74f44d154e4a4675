pub mod color;
pub mod geometric;

pub use color::*;
pub use geometric::*;
