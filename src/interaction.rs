pub mod anchors;
pub mod camera;
pub mod caster;
pub mod error;
pub mod features;
pub mod math;
pub mod overlay;
pub mod parser;
pub mod placement;
pub mod replay;

pub use math::*;
