//! # camrec Core
//!
//! Session traffic recording engine for multiplayer servers.
//!
//! This crate provides:
//! - A concurrent registry of in-flight recording sessions
//! - Periodic sweeps that flush full buffers and close idle sessions
//! - Append-only working files finalized by atomic rename
//! - A [`Recorder`] facade owning the background sweeper thread
//! - A [`RecordingCatalog`] for reading finished recordings back
//!
//! ## Example
//!
//! ```rust,ignore
//! use camrec_core::{Recorder, RecorderConfig, SessionOwner};
//!
//! let recorder = Recorder::open(RecorderConfig::new().directory("data/cams"));
//! let id = recorder.start_session(SessionOwner::new(42, 100, 7, "10.0.0.5".parse()?));
//! recorder.append_input(id, &[0x0a, 0xff]);
//! recorder.append_output(id, &[0x01]);
//! recorder.request_shutdown();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod clock;
mod config;
mod error;
mod finalizer;
mod naming;
mod recorder;
mod registry;
mod session;
mod stats;
mod sweeper;
mod types;
mod writer;

pub use camrec_codec::{CamLine, Direction};
pub use catalog::{RecordingCatalog, RecordingEntry, RecordingSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RecorderConfig, SweepPolicy};
pub use error::{CoreError, CoreResult};
pub use finalizer::Finalizer;
pub use naming::{FileKind, RecordingName};
pub use recorder::Recorder;
pub use registry::{SessionRegistry, SweepOutcome};
pub use session::{DetachedSession, Packet, SessionIdentity};
pub use stats::{RecorderStats, StatsSnapshot};
pub use sweeper::{CycleReport, SweepCycle, Sweeper};
pub use types::{SessionId, SessionOwner, Timestamp};
pub use writer::DiskWriter;
