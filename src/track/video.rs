//! Video tracks

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::{MediaStream, Track, TrackCore, TrackSignal};

/// Video frame dimensions
///
/// Both sides are unknown until the first frame has been decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
}

impl Dimensions {
    /// Known dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }
}

pub(super) struct VideoCore {
    core: TrackCore,
    dimensions: Cell<Dimensions>,
}

/// A video track
#[derive(Clone)]
pub struct VideoTrack(Rc<VideoCore>);

impl VideoTrack {
    /// Create a video track backed by `stream`
    ///
    /// The track is not added to the stream's track list; use
    /// [`MediaStream::add_video_track`] for that.
    pub fn new(id: impl Into<String>, stream: &MediaStream) -> Self {
        Self(Rc::new(VideoCore {
            core: TrackCore::new(id.into(), stream),
            dimensions: Cell::new(Dimensions::default()),
        }))
    }

    pub(super) fn core(&self) -> &TrackCore {
        &self.0.core
    }

    pub(super) fn ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Track identifier
    pub fn id(&self) -> &str {
        &self.0.core.id
    }

    /// Last known dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.0.dimensions.get()
    }

    /// Record new dimensions, firing `DimensionsChanged` if they differ
    pub fn set_dimensions(&self, dimensions: Dimensions) {
        if self.0.dimensions.replace(dimensions) == dimensions {
            return;
        }
        self.to_track().fire(TrackSignal::DimensionsChanged);
    }

    /// View as a [`Track`]
    pub fn to_track(&self) -> Track {
        Track::Video(self.clone())
    }
}

impl fmt::Debug for VideoTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoTrack")
            .field("id", &self.0.core.id)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}
