//! Track registry for a session
//!
//! The registry owns the authoritative view of which tracks belong to a
//! session and republishes their lifecycle signals as aggregate events.
//!
//! # Architecture
//!
//! ```text
//!                           TrackRegistry
//!                     ┌─────────────────────────┐
//!                     │ tracks: id → TrackEntry │
//!                     │ audio:  id → TrackEntry │
//!                     │ video:  id → TrackEntry │
//!                     │ media_streams: {stream} │
//!                     └───────────┬─────────────┘
//!                                 │ add / remove
//!            ┌────────────────────┼────────────────────┐
//!            │                    │                    │
//!            ▼                    ▼                    ▼
//!     rebroadcast::wire     trackAdded /         trackRemoved
//!     (per-track signals)   MediaEvents          MediaEvents
//!            │                    │                    │
//!            └──► MediaEvents ◄───┘                    ▼
//!                      │                        AttachmentManager
//!                      ▼
//!             listeners / broadcast receivers
//! ```
//!
//! # Derived state
//!
//! `audio`/`video` partition `tracks` by kind, and `media_streams` is the
//! set of distinct backing streams referenced by the registered tracks.
//! Additions extend the derived state in place; removals recompute the
//! stream set by a scan, which is cheap for the handful of tracks a
//! session carries.

pub mod entry;
mod rebroadcast;
pub mod store;

pub use entry::{Registration, RegistryStats, TrackEntry};
pub use store::{Reconciliation, TrackRegistry};
