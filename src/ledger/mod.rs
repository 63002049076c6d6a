//! Ledger module: numbering, transaction construction and final assembly

pub mod account;
pub mod core;
pub mod sequence;
pub mod transaction;

pub use account::*;
pub use self::core::*;
pub use sequence::*;
pub use transaction::*;
