//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod events;

pub use events::{EventRecorder, MemoryRecorder, NoopRecorder, RecordedEvent, TracingRecorder};
