//! Backing media streams
//!
//! A [`MediaStream`] groups the tracks that originate from one remote
//! source. It is compared by identity: two handles are equal only if they
//! refer to the same stream. The stream owns its track list; tracks keep a
//! weak reference back to their stream.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{AudioTrack, Track, TrackKind, VideoTrack};

pub(crate) struct StreamInner {
    id: String,
    tracks: RefCell<IndexMap<String, Track>>,
}

/// Handle to a backing stream
#[derive(Clone)]
pub struct MediaStream(Rc<StreamInner>);

impl MediaStream {
    /// Create an empty stream
    pub fn new(id: impl Into<String>) -> Self {
        Self(Rc::new(StreamInner {
            id: id.into(),
            tracks: RefCell::new(IndexMap::new()),
        }))
    }

    pub(crate) fn downgrade(&self) -> Weak<StreamInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<StreamInner>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Stream label
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Create an audio track on this stream and report it
    pub fn add_audio_track(&self, id: impl Into<String>) -> AudioTrack {
        let track = AudioTrack::new(id, self);
        self.add_track(track.to_track());
        track
    }

    /// Create a video track on this stream and report it
    pub fn add_video_track(&self, id: impl Into<String>) -> VideoTrack {
        let track = VideoTrack::new(id, self);
        self.add_track(track.to_track());
        track
    }

    /// Report `track` as part of this stream
    ///
    /// Returns `false` if a track with the same id is already reported.
    pub fn add_track(&self, track: Track) -> bool {
        let mut tracks = self.0.tracks.borrow_mut();
        if tracks.contains_key(track.id()) {
            return false;
        }
        tracks.insert(track.id().to_string(), track);
        true
    }

    /// Stop reporting the track with `id`
    pub fn remove_track(&self, id: &str) -> Option<Track> {
        self.0.tracks.borrow_mut().shift_remove(id)
    }

    /// Reported track by id
    pub fn get_track(&self, id: &str) -> Option<Track> {
        self.0.tracks.borrow().get(id).cloned()
    }

    /// All reported tracks
    pub fn tracks(&self) -> Vec<Track> {
        self.0.tracks.borrow().values().cloned().collect()
    }

    /// Reported audio tracks
    pub fn audio_tracks(&self) -> Vec<Track> {
        self.tracks_of(TrackKind::Audio)
    }

    /// Reported video tracks
    pub fn video_tracks(&self) -> Vec<Track> {
        self.tracks_of(TrackKind::Video)
    }

    /// Ids of all reported tracks
    pub fn track_ids(&self) -> Vec<String> {
        self.0.tracks.borrow().keys().cloned().collect()
    }

    fn tracks_of(&self, kind: TrackKind) -> Vec<Track> {
        self.0
            .tracks
            .borrow()
            .values()
            .filter(|track| track.kind() == kind)
            .cloned()
            .collect()
    }
}

impl PartialEq for MediaStream {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MediaStream {}

impl Hash for MediaStream {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.0.id)
            .field("tracks", &self.0.tracks.borrow().len())
            .finish()
    }
}
