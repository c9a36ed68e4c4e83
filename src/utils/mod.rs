// Utility functions

pub mod short_id;

pub use short_id::*;
