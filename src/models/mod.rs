//! Data models

pub mod observation;
pub mod controls;
pub mod session;

pub use observation::*;
pub use controls::*;
pub use session::*;
