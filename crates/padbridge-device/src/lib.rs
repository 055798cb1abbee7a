//! Device-source abstraction for PadBridge.
//!
//! A device source is anything that can report live controller input plus the
//! identity metadata (battery, connection, model) a DSU reply needs. Backends
//! publish raw readings through the single-slot [`SnapshotCell`] handoff; the
//! protocol server consumes them on demand through the [`DeviceSource`]
//! trait without ever blocking on device I/O.

#![deny(static_mut_refs)]

pub mod mock;
pub mod snapshot;
pub mod source;

pub use mock::MockSource;
pub use snapshot::{DeviceInputSnapshot, SnapshotPublisher, SnapshotReader, snapshot_cell};
pub use source::DeviceSource;
