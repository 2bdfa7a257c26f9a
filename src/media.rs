//! Session media
//!
//! [`Media`] is the session-facing handle: it owns the track registry and
//! the attachment manager, and exposes the aggregate events of both.

use std::fmt;

use tokio::sync::broadcast;

use crate::attach::{AttachmentManager, Detached, Renderer, Target};
use crate::config::MediaConfig;
use crate::error::Result;
use crate::event::{MediaEvent, MediaEventKind, Subscription};
use crate::registry::{Reconciliation, RegistryStats, TrackRegistry};
use crate::track::{MediaStream, Track};

/// The audio and video tracks of a session and the surfaces showing them
///
/// # Example
/// ```
/// use session_media::{Media, MediaStream, Renderer, Target, Track};
///
/// struct Console;
///
/// impl Renderer for Console {
///     type Surface = u32;
///     type Element = String;
///
///     fn create_container(&self) -> u32 { 1 }
///     fn resolve(&self, _query: &str) -> Option<u32> { None }
///     fn create_element(&self, track: &Track) -> String { track.id().to_string() }
///     fn destroy_element(&self, _track: &Track, _element: &String) {}
///     fn append(&self, surface: &u32, element: &String) { println!("{surface} += {element}") }
///     fn remove(&self, surface: &u32, element: &String) { println!("{surface} -= {element}") }
/// }
///
/// let media = Media::new(Console);
/// let surface = media.attach(Target::Default).unwrap();
///
/// let stream = MediaStream::new("remote");
/// media.add_stream(&stream);
/// let audio = stream.add_audio_track("mic").to_track();
/// media.add(&audio);
///
/// assert_eq!(media.rendered(&surface), vec![audio.clone()]);
/// audio.set_enabled(false);
/// assert!(media.is_muted());
/// ```
pub struct Media<R: Renderer> {
    config: MediaConfig,
    registry: TrackRegistry,
    attachments: AttachmentManager<R>,
}

impl<R: Renderer> Media<R> {
    /// Create session media with default configuration
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, MediaConfig::default())
    }

    /// Create session media with custom configuration
    pub fn with_config(renderer: R, config: MediaConfig) -> Self {
        let registry = TrackRegistry::new(config.event_capacity);
        let attachments = AttachmentManager::new(registry.clone(), renderer);

        Self {
            config,
            registry,
            attachments,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Get the track registry
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Get the attachment manager
    pub fn attachments(&self) -> &AttachmentManager<R> {
        &self.attachments
    }

    /// Get the rendering capability
    pub fn renderer(&self) -> &R {
        self.attachments.renderer()
    }

    /// Register a track; `false` if its id is already registered
    pub fn add(&self, track: &Track) -> bool {
        self.registry.add(track)
    }

    /// Unregister a track; unknown tracks are ignored
    pub fn remove(&self, track: &Track) {
        self.registry.remove(track)
    }

    /// Register every track a stream reports
    pub fn add_stream(&self, stream: &MediaStream) -> usize {
        self.registry.add_stream(stream)
    }

    /// Resynchronize with what `streams` currently report
    pub fn reconcile<'a, I>(&self, streams: I) -> Reconciliation
    where
        I: IntoIterator<Item = &'a MediaStream>,
    {
        self.registry.reconcile(streams)
    }

    /// Resynchronize with the streams already known
    pub fn refresh(&self) -> Reconciliation {
        self.registry.refresh()
    }

    /// Attach to a surface; see [`AttachmentManager::attach`]
    pub fn attach(&self, target: Target<R::Surface>) -> Result<R::Surface> {
        self.attachments.attach(target)
    }

    /// Detach from one or all surfaces; see [`AttachmentManager::detach`]
    pub fn detach(&self, target: Target<R::Surface>) -> Result<Detached<R::Surface>> {
        self.attachments.detach(target)
    }

    /// Tracks rendered into `surface`
    pub fn rendered(&self, surface: &R::Surface) -> Vec<Track> {
        self.attachments.rendered(surface)
    }

    /// Registered tracks
    pub fn tracks(&self) -> Vec<Track> {
        self.registry.tracks()
    }

    /// Registered audio tracks
    pub fn audio_tracks(&self) -> Vec<Track> {
        self.registry.audio_tracks()
    }

    /// Registered video tracks
    pub fn video_tracks(&self) -> Vec<Track> {
        self.registry.video_tracks()
    }

    /// Distinct backing streams of the registered tracks
    pub fn media_streams(&self) -> Vec<MediaStream> {
        self.registry.media_streams()
    }

    /// True if every audio track is disabled (or there are none)
    pub fn is_muted(&self) -> bool {
        self.registry.is_muted()
    }

    /// True if every video track is disabled (or there are none)
    pub fn is_paused(&self) -> bool {
        self.registry.is_paused()
    }

    /// Membership snapshot
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Listen to one aggregate event kind
    pub fn on<F>(&self, kind: MediaEventKind, listener: F) -> Subscription
    where
        F: FnMut(&Track) + 'static,
    {
        self.registry.events().on(kind, listener)
    }

    /// Receive every aggregate event asynchronously
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.registry.events().subscribe()
    }
}

impl<R: Renderer> fmt::Debug for Media<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("attachments", &self.attachments)
            .finish()
    }
}
