pub mod error;
pub mod sink;
pub mod source;
