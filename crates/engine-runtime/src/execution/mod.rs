pub mod coordinator;
pub mod factory;
