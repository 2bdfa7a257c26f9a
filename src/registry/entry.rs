//! Registry entry types
//!
//! This module defines the per-track state stored in the registry.

use crate::track::Track;

/// One add-to-remove interval of a track id in the registry
///
/// Re-adding a track after removing it yields a new registration, which is
/// how listeners wired for an earlier registration recognize they are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Registration(u64);

impl Registration {
    pub(super) fn new(value: u64) -> Self {
        Self(value)
    }
}

/// Entry for a single track in the registry
#[derive(Debug, Clone)]
pub struct TrackEntry {
    /// The registered track instance
    pub track: Track,

    /// Registration this entry belongs to
    pub registration: Registration,
}

/// Snapshot of registry membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of registered tracks
    pub track_count: usize,
    /// Number of registered audio tracks
    pub audio_count: usize,
    /// Number of registered video tracks
    pub video_count: usize,
    /// Number of distinct backing streams
    pub stream_count: usize,
    /// Whether every audio track is disabled (or there are none)
    pub is_muted: bool,
    /// Whether every video track is disabled (or there are none)
    pub is_paused: bool,
}
