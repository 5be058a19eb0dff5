//! Core data types for the P2P rate bot.

pub mod alert;
pub mod market;
pub mod offer;
pub mod side;

pub use alert::*;
pub use market::*;
pub use offer::*;
pub use side::*;
