//! Repository layer
//!
//! Repositories are thin adapters over the remote APIs. They carry no
//! dispatch logic and exist so the dispatcher can be driven by in-memory
//! fakes in tests.
//!
//! All repositories are trait-based to enable testing and mocking.

mod services;
mod storage;

// Re-export traits
pub use services::ServiceRepository;
pub use storage::{EventStream, ObjectStore, StoreConnector};

// Re-export implementations
pub use services::HttpServiceRepository;
pub use storage::{MinioConnector, MinioObjectStore};
