pub mod intake;
pub mod narrative;

pub use intake::*;
pub use narrative::*;
