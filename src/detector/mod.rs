pub mod at_bat;
pub mod classifier;

pub use at_bat::{detect, Detection};
