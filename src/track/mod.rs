//! Track model
//!
//! A [`Track`] is one audio or video signal of a session. Tracks are created
//! and driven by the signaling layer; the engine only references them,
//! listens to their lifecycle signals and asks them to render.
//!
//! The set of track kinds is closed: [`AudioTrack`] and [`VideoTrack`] are
//! the only variants, and kind-specific behavior is a match on [`Track`].
//! Two `Track` values are equal when they are the same instance; the `id`
//! alone does not make two tracks equal.

pub mod audio;
pub mod stream;
pub mod video;

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;
use std::rc::Weak;

use crate::attach::Renderer;
use crate::event::{Emitter, Subscription};

pub use audio::AudioTrack;
pub use stream::MediaStream;
pub use video::{Dimensions, VideoTrack};

use stream::StreamInner;

/// Kind of media a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl TrackKind {
    /// Kind name as used by WebRTC (`"audio"` / `"video"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle signal of a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSignal {
    /// Media started flowing
    Started,
    /// The track ended (terminal)
    Ended,
    /// The track was enabled
    Enabled,
    /// The track was disabled
    Disabled,
    /// Video dimensions changed (video tracks only)
    DimensionsChanged,
}

impl TrackSignal {
    /// All signals
    pub const ALL: [TrackSignal; 5] = [
        TrackSignal::Started,
        TrackSignal::Ended,
        TrackSignal::Enabled,
        TrackSignal::Disabled,
        TrackSignal::DimensionsChanged,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// State shared by every track variant
pub(crate) struct TrackCore {
    id: String,
    stream: Weak<StreamInner>,
    enabled: Cell<bool>,
    started: Cell<bool>,
    ended: Cell<bool>,
    signals: [Emitter<Track>; 5],
}

impl TrackCore {
    pub(crate) fn new(id: String, stream: &MediaStream) -> Self {
        Self {
            id,
            stream: stream.downgrade(),
            enabled: Cell::new(true),
            started: Cell::new(false),
            ended: Cell::new(false),
            signals: std::array::from_fn(|_| Emitter::new()),
        }
    }
}

/// An audio or video track
#[derive(Clone)]
pub enum Track {
    /// Audio variant
    Audio(AudioTrack),
    /// Video variant
    Video(VideoTrack),
}

impl Track {
    fn core(&self) -> &TrackCore {
        match self {
            Track::Audio(audio) => audio.core(),
            Track::Video(video) => video.core(),
        }
    }

    fn ptr(&self) -> *const () {
        match self {
            Track::Audio(audio) => audio.ptr(),
            Track::Video(video) => video.ptr(),
        }
    }

    /// Track identifier, unique within a session
    pub fn id(&self) -> &str {
        &self.core().id
    }

    /// Kind of the track
    pub fn kind(&self) -> TrackKind {
        match self {
            Track::Audio(_) => TrackKind::Audio,
            Track::Video(_) => TrackKind::Video,
        }
    }

    /// Whether the track is enabled
    pub fn is_enabled(&self) -> bool {
        self.core().enabled.get()
    }

    /// Whether the track has started
    pub fn is_started(&self) -> bool {
        self.core().started.get()
    }

    /// Whether the track has ended
    pub fn is_ended(&self) -> bool {
        self.core().ended.get()
    }

    /// The backing stream, if it is still alive
    ///
    /// A track only holds a weak reference to its stream. Once every
    /// [`MediaStream`] handle is dropped this returns `None`, and a registry
    /// holding the track leaves it out of its backing streams. A registry
    /// keeps the streams of its tracks alive from registration on.
    pub fn media_stream(&self) -> Option<MediaStream> {
        MediaStream::upgrade(&self.core().stream)
    }

    /// Last known dimensions (video tracks only)
    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            Track::Audio(_) => None,
            Track::Video(video) => Some(video.dimensions()),
        }
    }

    /// The audio variant, if this is an audio track
    pub fn as_audio(&self) -> Option<&AudioTrack> {
        match self {
            Track::Audio(audio) => Some(audio),
            Track::Video(_) => None,
        }
    }

    /// The video variant, if this is a video track
    pub fn as_video(&self) -> Option<&VideoTrack> {
        match self {
            Track::Audio(_) => None,
            Track::Video(video) => Some(video),
        }
    }

    /// Listen to a signal; returning `ControlFlow::Break(())` disposes the listener
    pub fn subscribe<F>(&self, signal: TrackSignal, listener: F) -> Subscription
    where
        F: FnMut(&Track) -> ControlFlow<()> + 'static,
    {
        self.core().signals[signal.index()].subscribe(listener)
    }

    /// Listen to a signal until the handle is disposed
    pub fn on<F>(&self, signal: TrackSignal, listener: F) -> Subscription
    where
        F: FnMut(&Track) + 'static,
    {
        self.core().signals[signal.index()].on(listener)
    }

    /// Listen to the next firing of a signal only
    pub fn once<F>(&self, signal: TrackSignal, listener: F) -> Subscription
    where
        F: FnOnce(&Track) + 'static,
    {
        self.core().signals[signal.index()].once(listener)
    }

    /// Number of listeners registered for a signal
    pub fn listener_count(&self, signal: TrackSignal) -> usize {
        self.core().signals[signal.index()].listener_count()
    }

    /// Create a rendered element for this track
    pub fn attach<R: Renderer>(&self, renderer: &R) -> R::Element {
        renderer.create_element(self)
    }

    /// Destroy an element previously created by [`Track::attach`]
    pub fn detach<R: Renderer>(&self, renderer: &R, element: &R::Element) {
        renderer.destroy_element(self, element);
    }

    /// Mark the track as started
    ///
    /// Fires `Started` the first time only, and never after the track ended.
    pub fn start(&self) {
        let core = self.core();
        if core.started.get() || core.ended.get() {
            return;
        }
        core.started.set(true);
        self.fire(TrackSignal::Started);
    }

    /// End the track
    ///
    /// Ending is terminal; `Ended` fires once.
    pub fn end(&self) {
        let core = self.core();
        if core.ended.replace(true) {
            return;
        }
        self.fire(TrackSignal::Ended);
    }

    /// Enable or disable the track
    ///
    /// Fires `Enabled` or `Disabled` only when the value changes.
    pub fn set_enabled(&self, enabled: bool) {
        if self.core().enabled.replace(enabled) == enabled {
            return;
        }
        self.fire(if enabled {
            TrackSignal::Enabled
        } else {
            TrackSignal::Disabled
        });
    }

    pub(crate) fn fire(&self, signal: TrackSignal) {
        self.core().signals[signal.index()].emit(self);
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.ptr() == other.ptr()
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr().hash(state);
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("enabled", &self.is_enabled())
            .field("ended", &self.is_ended())
            .finish()
    }
}

impl From<AudioTrack> for Track {
    fn from(track: AudioTrack) -> Self {
        Track::Audio(track)
    }
}

impl From<VideoTrack> for Track {
    fn from(track: VideoTrack) -> Self {
        Track::Video(track)
    }
}
