//! # Larder Testing
//!
//! Testing utilities for Larder reducers and stores.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - In-memory [`mocks`] of the gateway and the token store
//! - [`fixtures`] for wire types and a seeded service
//! - proptest strategies in [`properties`]
//!
//! ## Example
//!
//! ```
//! use larder_client::Gateway;
//! use larder_testing::fixtures;
//!
//! # tokio_test::block_on(async {
//! let gateway = fixtures::sample_gateway();
//! let recipes = gateway.list_recipes().await.unwrap();
//! assert_eq!(recipes.len(), 2);
//! # });
//! ```

pub mod fixtures;
pub mod mocks;
pub mod properties;
pub mod reducer_test;

pub use mocks::{Call, MemoryTokenStore, MockGateway};
pub use reducer_test::{ReducerTest, assertions, effects};

/// Install a test subscriber that honours `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
