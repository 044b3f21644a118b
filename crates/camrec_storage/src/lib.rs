//! # camrec Storage
//!
//! Storage backends for camrec recordings.
//!
//! A recording store is a flat namespace of **opaque named files** living in
//! one directory. Stores only append bytes, rename files and read them back;
//! they know nothing about sessions, packets or the `.cam` line format.
//!
//! ## Design Principles
//!
//! - Every `append` opens, writes and closes; no handle outlives a call
//! - Names are plain file names, never paths
//! - Must be `Send + Sync` so the sweeper thread can share a store
//! - camrec owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`DirectoryStore`] - Files in an OS directory
//! - [`InMemoryStore`] - For testing
//!
//! ## Example
//!
//! ```rust
//! use camrec_storage::{InMemoryStore, RecordingStore};
//!
//! let store = InMemoryStore::new();
//! store.append("7.1000.cam.tmp", b"> 0 00\n").unwrap();
//! store.rename("7.1000.cam.tmp", "7.1000.cam").unwrap();
//! assert_eq!(store.read("7.1000.cam").unwrap(), b"> 0 00\n");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod directory;
mod error;
mod memory;

pub use backend::{validate_name, RecordingStore};
pub use directory::DirectoryStore;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
