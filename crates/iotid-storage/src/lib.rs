//! # iotid-storage
//!
//! Storage abstraction layer for the device identity service.
//!
//! Values are bincode-encoded and grouped into column families. The
//! RocksDB implementation backs the persistent device registry.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod rocksdb_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};
