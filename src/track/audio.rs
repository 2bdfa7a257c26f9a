//! Audio tracks

use std::fmt;
use std::rc::Rc;

use super::{MediaStream, Track, TrackCore};

/// An audio track
#[derive(Clone)]
pub struct AudioTrack(Rc<TrackCore>);

impl AudioTrack {
    /// Create an audio track backed by `stream`
    ///
    /// The track is not added to the stream's track list; use
    /// [`MediaStream::add_audio_track`] for that.
    pub fn new(id: impl Into<String>, stream: &MediaStream) -> Self {
        Self(Rc::new(TrackCore::new(id.into(), stream)))
    }

    pub(super) fn core(&self) -> &TrackCore {
        &self.0
    }

    pub(super) fn ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Track identifier
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// View as a [`Track`]
    pub fn to_track(&self) -> Track {
        Track::Audio(self.clone())
    }
}

impl fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AudioTrack").field(&self.0.id).finish()
    }
}
