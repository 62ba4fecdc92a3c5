//! Document Upload Storage Library
//!
//! This crate provides the storage abstraction for uploaded documents and its local
//! filesystem implementation.
//!
//! # Stored file names
//!
//! Every stored file is named `{id}{extension}`, where `id` is a freshly generated
//! 128-bit identifier rendered as 32 lowercase hex characters and `extension` is the
//! original filename's extension (with its dot, case preserved). Names are flat: they
//! never contain path separators or `..`. Name generation and checking live in the
//! `keys` module so every backend agrees on the format.

pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{IncomingFile, Storage, StorageError, StorageResult};
pub use tokio_util::sync::CancellationToken;
