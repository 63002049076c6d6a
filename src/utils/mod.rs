//! Utility modules

pub mod csv_sink;
pub mod file_store;
pub mod memory_sink;
pub mod validation;

pub use csv_sink::*;
pub use file_store::*;
pub use memory_sink::*;
pub use validation::*;
