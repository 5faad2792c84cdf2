//! Mock implementations of environment traits

mod gateway;
mod token_store;

pub use gateway::{Call, MockGateway};
pub use token_store::MemoryTokenStore;
