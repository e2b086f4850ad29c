pub mod chain; // Cache → remote → local rules → basic
pub mod generation; // Cache-aware retrying generation gateway
pub mod prompt;
pub mod questions; // Follow-up question parsing and local bank
pub mod rules; // Deterministic narrative + red flags

pub use chain::DegradationChain;
