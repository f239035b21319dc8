pub mod health;
pub mod diagnostics;
pub mod session_info;

pub use health::*;
pub use diagnostics::*;
pub use session_info::*;
