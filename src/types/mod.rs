//! Type definitions

pub mod catalog;
pub mod messages;
pub mod order;
pub mod plan;

pub use catalog::*;
pub use messages::*;
pub use order::*;
pub use plan::*;
