pub mod client;
pub mod status;

pub use client::{BatchVerifier, ContactsVerifier};
