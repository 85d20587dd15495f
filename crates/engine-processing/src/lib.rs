pub mod batcher;
pub mod error;
pub mod normalize;
pub mod pool;
pub mod results;
pub mod retry;
pub mod verify;
pub mod writer;
