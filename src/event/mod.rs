//! Session-scoped aggregate events
//!
//! Every track lifecycle signal the registry cares about is republished as
//! a [`MediaEvent`] carrying the track. Consumers can listen synchronously
//! through an [`Emitter`] per event kind, or asynchronously through a
//! `tokio::sync::broadcast` receiver.
//!
//! ```text
//!   Track signals ──► EventRebroadcaster ──┐
//!                                          ├──► MediaEvents ──► emitters[kind] ──► listeners
//!   TrackRegistry add/remove ──────────────┘              └──► broadcast::Sender ──► receivers
//! ```

pub mod emitter;

use std::fmt;

use tokio::sync::broadcast;

use crate::track::Track;

pub use emitter::{Emitter, Subscription};

/// Kind of aggregate event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    /// A track was added to the session
    TrackAdded,
    /// A video track's dimensions changed
    TrackDimensionsChanged,
    /// A track was disabled
    TrackDisabled,
    /// A track was enabled
    TrackEnabled,
    /// A track ended
    TrackEnded,
    /// A track was removed from the session
    TrackRemoved,
    /// A track started
    TrackStarted,
}

impl MediaEventKind {
    /// All event kinds
    pub const ALL: [MediaEventKind; 7] = [
        MediaEventKind::TrackAdded,
        MediaEventKind::TrackDimensionsChanged,
        MediaEventKind::TrackDisabled,
        MediaEventKind::TrackEnabled,
        MediaEventKind::TrackEnded,
        MediaEventKind::TrackRemoved,
        MediaEventKind::TrackStarted,
    ];

    /// Event name
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaEventKind::TrackAdded => "trackAdded",
            MediaEventKind::TrackDimensionsChanged => "trackDimensionsChanged",
            MediaEventKind::TrackDisabled => "trackDisabled",
            MediaEventKind::TrackEnabled => "trackEnabled",
            MediaEventKind::TrackEnded => "trackEnded",
            MediaEventKind::TrackRemoved => "trackRemoved",
            MediaEventKind::TrackStarted => "trackStarted",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MediaEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aggregate event as delivered to broadcast receivers
#[derive(Debug, Clone)]
pub struct MediaEvent {
    /// What happened
    pub kind: MediaEventKind,
    /// The track it happened to
    pub track: Track,
}

/// Aggregate event hub for one session
pub struct MediaEvents {
    emitters: [Emitter<Track>; 7],
    tx: broadcast::Sender<MediaEvent>,
}

impl MediaEvents {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));

        Self {
            emitters: std::array::from_fn(|_| Emitter::new()),
            tx,
        }
    }

    /// The synchronous emitter for one event kind
    pub fn emitter(&self, kind: MediaEventKind) -> &Emitter<Track> {
        &self.emitters[kind.index()]
    }

    /// Listen to one event kind until the handle is disposed
    pub fn on<F>(&self, kind: MediaEventKind, listener: F) -> Subscription
    where
        F: FnMut(&Track) + 'static,
    {
        self.emitter(kind).on(listener)
    }

    /// Receive every aggregate event asynchronously
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to broadcast receivers, then to listeners
    pub(crate) fn emit(&self, kind: MediaEventKind, track: &Track) {
        // No receivers is not an error
        let receivers = self
            .tx
            .send(MediaEvent {
                kind,
                track: track.clone(),
            })
            .unwrap_or(0);
        tracing::trace!(event = %kind, track = track.id(), receivers, "Emitting media event");

        self.emitter(kind).emit(track);
    }
}

impl fmt::Debug for MediaEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MediaEvents");
        for kind in MediaEventKind::ALL {
            s.field(kind.as_str(), &self.emitter(kind).listener_count());
        }
        s.field("receivers", &self.tx.receiver_count()).finish()
    }
}
