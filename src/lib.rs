//! Track aggregation and attachment for communication sessions
//!
//! `session-media` keeps the authoritative view of which audio and video
//! tracks belong to a session, derives summary state from it (muted,
//! paused, backing streams), and keeps any number of rendering surfaces in
//! sync with the live track set as tracks arrive, end, or are removed.
//!
//! The signaling layer that produces tracks and the UI toolkit that shows
//! them stay outside: tracks come in as [`Track`] values, and surfaces are
//! managed through a [`Renderer`] supplied by the application.
//!
//! # Architecture
//!
//! ```text
//!   signaling ──► Media::add / remove / reconcile
//!                        │
//!                        ▼
//!                 ┌──────────────┐  trackAdded / trackRemoved   ┌───────────────────┐
//!                 │TrackRegistry │─────────────────────────────►│ AttachmentManager │
//!                 └──────┬───────┘                              └─────────┬─────────┘
//!                        │ per-track signals                              │ Track::Ended
//!                        ▼                                                ▼
//!                 rebroadcast ──► MediaEvents ──► listeners      Renderer (create / append /
//!                                      └────────► broadcast rx    remove / destroy)
//! ```
//!
//! Everything runs on one thread. Listeners are invoked synchronously from
//! the call that caused the event, and stop themselves once the track or
//! surface they were wired for is gone.

pub mod attach;
pub mod config;
pub mod error;
pub mod event;
pub mod media;
pub mod registry;
pub mod track;

#[cfg(test)]
pub(crate) mod testing;

pub use attach::{AttachmentManager, Detached, Renderer, Target};
pub use config::MediaConfig;
pub use error::{Error, Result};
pub use event::{Emitter, MediaEvent, MediaEventKind, MediaEvents, Subscription};
pub use media::Media;
pub use registry::{Reconciliation, RegistryStats, TrackRegistry};
pub use track::{
    AudioTrack, Dimensions, MediaStream, Track, TrackKind, TrackSignal, VideoTrack,
};
