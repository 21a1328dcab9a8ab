pub mod diagnostics;
pub mod health;
pub mod progress;

pub use diagnostics::*;
pub use health::*;
pub use progress::*;
