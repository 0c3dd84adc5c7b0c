//! In-process storage emulator
//!
//! Implements both backend traits over in-memory state, optionally persisted
//! to a JSON snapshot file.

pub mod backend;
pub mod store;

pub use backend::MemoryBackend;
