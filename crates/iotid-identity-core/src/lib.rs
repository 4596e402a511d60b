//! # iotid-identity-core
//!
//! Device Identity Core: the registration → enrollment lifecycle.
//!
//! - Organizations, each with a server certificate issued at creation
//! - Device pre-registration, minting a client certificate per device
//! - Device-initiated enrollment from model and serial assertions, with
//!   optional auto-registration gated by a signing-key allowlist
//! - The `Waiting` / `Enrolled` / `Disabled` status state machine

#![warn(clippy::all)]

pub mod allowlist;
pub mod config;
pub mod datastore;
pub mod errors;
mod service;
pub mod traits;
pub mod types;


pub use allowlist::KeyAllowlist;
pub use config::{AllowlistConfig, IdentityCoreConfig};
pub use datastore::{DataStore, DataStoreError, MemoryDataStore, StorageDataStore};
pub use errors::{IdentityCoreError, Result};
pub use service::{split_enrollment_assertions, IdentityCoreService};
pub use traits::IdentityCore;
pub use types::*;
