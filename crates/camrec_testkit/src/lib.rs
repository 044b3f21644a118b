//! # camrec Testkit
//!
//! Test utilities for camrec.
//!
//! This crate provides:
//! - Recorder fixtures over temporary directories or memory, driven by a manual clock
//! - A fault-injecting store for write and rename failures
//! - Property-based generators for owners and traffic
//! - A concurrent producer stress driver
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camrec_testkit::prelude::*;
//!
//! #[test]
//! fn closes_idle_sessions() {
//!     let rec = TestRecorder::memory(RecorderConfig::new());
//!     let id = rec.start_session(owner(1));
//!     rec.append_output(id, &[1]);
//!     rec.request_shutdown();
//!     assert_eq!(rec.file_names(), vec![format!("1.{TEST_EPOCH}.cam")]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use camrec_core::{Direction, RecorderConfig, SessionOwner};
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
