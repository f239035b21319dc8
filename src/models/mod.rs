pub mod entity;
pub mod messages;
pub mod health;
pub mod diagnostics;
pub mod session_info;
pub mod error;

pub use entity::*;
pub use messages::*;
pub use health::*;
pub use diagnostics::*;
pub use session_info::*;
pub use error::*;
