//! Track registry implementation
//!
//! The central registry that owns the canonical id → track mapping of a
//! session, its per-kind partitions and the derived set of backing streams.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use super::entry::{Registration, RegistryStats, TrackEntry};
use super::rebroadcast;
use crate::event::{MediaEventKind, MediaEvents};
use crate::track::{MediaStream, Track, TrackKind};

/// Result of a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Tracks newly registered
    pub added: usize,
    /// Tracks dropped because no known stream reports them any more
    pub removed: usize,
}

/// Registry maps
///
/// `audio` and `video` partition `tracks` by kind, and `media_streams` is
/// the set of streams referenced by `tracks`. Both hold after every
/// mutation that goes through this type.
pub(crate) struct RegistryState {
    tracks: IndexMap<String, TrackEntry>,
    audio: IndexMap<String, TrackEntry>,
    video: IndexMap<String, TrackEntry>,
    media_streams: IndexSet<MediaStream>,
    next_registration: u64,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            tracks: IndexMap::new(),
            audio: IndexMap::new(),
            video: IndexMap::new(),
            media_streams: IndexSet::new(),
            next_registration: 1,
        }
    }

    fn kind_map(&self, kind: TrackKind) -> &IndexMap<String, TrackEntry> {
        match kind {
            TrackKind::Audio => &self.audio,
            TrackKind::Video => &self.video,
        }
    }

    fn kind_map_mut(&mut self, kind: TrackKind) -> &mut IndexMap<String, TrackEntry> {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Video => &mut self.video,
        }
    }

    fn insert(&mut self, track: &Track) -> Registration {
        let registration = Registration::new(self.next_registration);
        self.next_registration += 1;

        let entry = TrackEntry {
            track: track.clone(),
            registration,
        };
        self.kind_map_mut(track.kind())
            .insert(track.id().to_string(), entry.clone());
        self.tracks.insert(track.id().to_string(), entry);

        if let Some(stream) = track.media_stream() {
            self.media_streams.insert(stream);
        }

        registration
    }

    fn remove(&mut self, id: &str) -> Option<TrackEntry> {
        let entry = self.tracks.shift_remove(id)?;
        self.kind_map_mut(entry.track.kind()).shift_remove(id);
        self.recompute_media_streams();
        Some(entry)
    }

    fn recompute_media_streams(&mut self) {
        self.media_streams = self
            .tracks
            .values()
            .filter_map(|entry| entry.track.media_stream())
            .collect();
    }

    /// Whether `track` is registered under `registration`
    pub(crate) fn is_current(&self, track: &Track, registration: Registration) -> bool {
        self.kind_map(track.kind())
            .get(track.id())
            .map_or(false, |entry| entry.registration == registration)
    }

    fn all_disabled(&self, kind: TrackKind) -> bool {
        self.kind_map(kind)
            .values()
            .all(|entry| !entry.track.is_enabled())
    }
}

/// Registry of the tracks belonging to one session
///
/// Cheap to clone; clones share the same state and event hub.
#[derive(Clone)]
pub struct TrackRegistry {
    pub(crate) state: Rc<RefCell<RegistryState>>,
    pub(crate) events: Rc<MediaEvents>,
}

impl TrackRegistry {
    /// Create an empty registry whose event channel holds `event_capacity` events
    pub fn new(event_capacity: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegistryState::new())),
            events: Rc::new(MediaEvents::new(event_capacity)),
        }
    }

    /// The aggregate event hub
    pub fn events(&self) -> &MediaEvents {
        &self.events
    }

    /// Register a track
    ///
    /// Returns `false` without side effects if a track with the same id is
    /// already registered. Otherwise the track's signals are wired for
    /// rebroadcast and `trackAdded` is emitted.
    pub fn add(&self, track: &Track) -> bool {
        let registration = {
            let mut state = self.state.borrow_mut();
            if state.tracks.contains_key(track.id()) {
                tracing::debug!(track = track.id(), "Track already registered");
                return false;
            }
            state.insert(track)
        };

        rebroadcast::wire(self, track, registration);

        tracing::info!(
            track = track.id(),
            kind = %track.kind(),
            tracks = self.len(),
            "Track added"
        );
        self.events.emit(MediaEventKind::TrackAdded, track);
        true
    }

    /// Unregister a track
    ///
    /// Lookup is by id. Does nothing if the id is unknown; otherwise emits
    /// `trackRemoved` with the registered instance.
    pub fn remove(&self, track: &Track) {
        let removed = self.state.borrow_mut().remove(track.id());
        let Some(entry) = removed else {
            return;
        };

        tracing::info!(
            track = entry.track.id(),
            kind = %entry.track.kind(),
            tracks = self.len(),
            "Track removed"
        );
        self.events.emit(MediaEventKind::TrackRemoved, &entry.track);
    }

    /// Register every track `stream` reports, audio first
    ///
    /// Returns the number of newly registered tracks.
    pub fn add_stream(&self, stream: &MediaStream) -> usize {
        stream
            .audio_tracks()
            .iter()
            .chain(stream.video_tracks().iter())
            .filter(|track| self.add(track))
            .count()
    }

    /// Resynchronize the registry with what `streams` currently report
    ///
    /// Tracks no stream reports are removed, then tracks reported but not
    /// yet registered are added.
    pub fn reconcile<'a, I>(&self, streams: I) -> Reconciliation
    where
        I: IntoIterator<Item = &'a MediaStream>,
    {
        let streams: Vec<MediaStream> = streams.into_iter().cloned().collect();
        let reported: HashSet<String> = streams
            .iter()
            .flat_map(|stream| stream.track_ids())
            .collect();

        let stale: Vec<Track> = self
            .state
            .borrow()
            .tracks
            .values()
            .filter(|entry| !reported.contains(entry.track.id()))
            .map(|entry| entry.track.clone())
            .collect();
        for track in &stale {
            self.remove(track);
        }

        let added = streams.iter().map(|stream| self.add_stream(stream)).sum();
        self.state.borrow_mut().recompute_media_streams();

        let result = Reconciliation {
            added,
            removed: stale.len(),
        };
        tracing::debug!(
            streams = streams.len(),
            added = result.added,
            removed = result.removed,
            "Reconciled tracks"
        );
        result
    }

    /// Reconcile against the streams the registry already knows
    pub fn refresh(&self) -> Reconciliation {
        let streams = self.media_streams();
        self.reconcile(&streams)
    }

    /// Registered track by id
    pub fn get(&self, id: &str) -> Option<Track> {
        self.state
            .borrow()
            .tracks
            .get(id)
            .map(|entry| entry.track.clone())
    }

    /// Whether a track with `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().tracks.contains_key(id)
    }

    /// Registered tracks in insertion order
    pub fn tracks(&self) -> Vec<Track> {
        Self::collect(&self.state.borrow().tracks)
    }

    /// Registered audio tracks in insertion order
    pub fn audio_tracks(&self) -> Vec<Track> {
        Self::collect(&self.state.borrow().audio)
    }

    /// Registered video tracks in insertion order
    pub fn video_tracks(&self) -> Vec<Track> {
        Self::collect(&self.state.borrow().video)
    }

    /// Distinct backing streams of the registered tracks
    pub fn media_streams(&self) -> Vec<MediaStream> {
        self.state.borrow().media_streams.iter().cloned().collect()
    }

    /// Number of registered tracks
    pub fn len(&self) -> usize {
        self.state.borrow().tracks.len()
    }

    /// Whether no track is registered
    pub fn is_empty(&self) -> bool {
        self.state.borrow().tracks.is_empty()
    }

    /// True if there are no audio tracks or all of them are disabled
    pub fn is_muted(&self) -> bool {
        self.state.borrow().all_disabled(TrackKind::Audio)
    }

    /// True if there are no video tracks or all of them are disabled
    pub fn is_paused(&self) -> bool {
        self.state.borrow().all_disabled(TrackKind::Video)
    }

    /// Membership snapshot
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.borrow();
        RegistryStats {
            track_count: state.tracks.len(),
            audio_count: state.audio.len(),
            video_count: state.video.len(),
            stream_count: state.media_streams.len(),
            is_muted: state.all_disabled(TrackKind::Audio),
            is_paused: state.all_disabled(TrackKind::Video),
        }
    }

    fn collect(map: &IndexMap<String, TrackEntry>) -> Vec<Track> {
        map.values().map(|entry| entry.track.clone()).collect()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for TrackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::track::{AudioTrack, VideoTrack};

    fn assert_invariants(registry: &TrackRegistry) {
        let state = registry.state.borrow();

        // Every track sits in exactly the kind map matching its kind
        for (id, entry) in &state.tracks {
            let (own, other) = match entry.track.kind() {
                TrackKind::Audio => (&state.audio, &state.video),
                TrackKind::Video => (&state.video, &state.audio),
            };
            assert!(own.get(id).map_or(false, |e| e.track == entry.track));
            assert!(!other.contains_key(id));
        }
        assert_eq!(state.audio.len() + state.video.len(), state.tracks.len());

        let expected: HashSet<MediaStream> = state
            .tracks
            .values()
            .filter_map(|entry| entry.track.media_stream())
            .collect();
        let actual: HashSet<MediaStream> = state.media_streams.iter().cloned().collect();
        assert_eq!(actual, expected);
    }

    fn count_events(registry: &TrackRegistry, kind: MediaEventKind) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        registry.events().on(kind, move |_| c.set(c.get() + 1));
        count
    }

    #[test]
    fn test_add_partitions_by_kind() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let audio = stream.add_audio_track("a1").to_track();
        let video = stream.add_video_track("v1").to_track();

        assert!(registry.add(&audio));
        assert!(registry.add(&video));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.audio_tracks(), vec![audio]);
        assert_eq!(registry.video_tracks(), vec![video]);
        assert_eq!(registry.media_streams(), vec![stream]);
        assert_invariants(&registry);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let registry = TrackRegistry::default();
        let added = count_events(&registry, MediaEventKind::TrackAdded);
        let stream = MediaStream::new("s1");
        let track = stream.add_audio_track("a1").to_track();

        assert!(registry.add(&track));
        assert!(!registry.add(&track));

        // A different instance with the same id is also ignored
        let twin: Track = AudioTrack::new("a1", &stream).into();
        assert!(!registry.add(&twin));

        assert_eq!(registry.len(), 1);
        assert_eq!(added.get(), 1);
        assert_eq!(registry.get("a1"), Some(track));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = TrackRegistry::default();
        let removed = count_events(&registry, MediaEventKind::TrackRemoved);
        let stream = MediaStream::new("s1");
        let track = stream.add_video_track("v1").to_track();

        registry.remove(&track);

        assert_eq!(removed.get(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_recomputes_media_streams() {
        let registry = TrackRegistry::default();
        let s1 = MediaStream::new("s1");
        let s2 = MediaStream::new("s2");
        let a1 = s1.add_audio_track("a1").to_track();
        let v1 = s1.add_video_track("v1").to_track();
        let v2 = s2.add_video_track("v2").to_track();

        for track in [&a1, &v1, &v2] {
            registry.add(track);
        }
        assert_eq!(registry.media_streams(), vec![s1.clone(), s2.clone()]);

        registry.remove(&v2);
        assert_eq!(registry.media_streams(), vec![s1.clone()]);

        registry.remove(&a1);
        assert_eq!(registry.media_streams(), vec![s1]);

        registry.remove(&v1);
        assert!(registry.media_streams().is_empty());
        assert_invariants(&registry);
    }

    #[test]
    fn test_muted_and_paused() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let a1 = stream.add_audio_track("a1").to_track();
        let a2 = stream.add_audio_track("a2").to_track();
        let v1 = stream.add_video_track("v1").to_track();

        // Vacuously true when empty
        assert!(registry.is_muted());
        assert!(registry.is_paused());

        registry.add(&a1);
        registry.add(&a2);
        registry.add(&v1);
        assert!(!registry.is_muted());
        assert!(!registry.is_paused());

        a1.set_enabled(false);
        assert!(!registry.is_muted());
        a2.set_enabled(false);
        assert!(registry.is_muted());

        v1.set_enabled(false);
        assert!(registry.is_paused());
        v1.set_enabled(true);
        assert!(!registry.is_paused());
    }

    #[test]
    fn test_session_scenario() {
        let registry = TrackRegistry::default();
        let s1 = MediaStream::new("s1");
        let a1 = s1.add_audio_track("A1").to_track();
        let v1 = s1.add_video_track("V1").to_track();

        registry.add(&a1);
        registry.add(&v1);
        assert_eq!(registry.media_streams(), vec![s1.clone()]);
        assert!(!registry.is_muted());
        assert!(!registry.is_paused());

        a1.set_enabled(false);
        assert!(registry.is_muted());

        registry.remove(&v1);
        assert!(registry.video_tracks().is_empty());
        assert!(registry.is_paused());
        assert_eq!(registry.media_streams(), vec![s1]);
    }

    #[test]
    fn test_add_stream_audio_first() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        stream.add_video_track("v1");
        stream.add_audio_track("a1");

        assert_eq!(registry.add_stream(&stream), 2);
        assert_eq!(registry.add_stream(&stream), 0);

        let ids: Vec<String> = registry.tracks().iter().map(|t| t.id().to_string()).collect();
        assert_eq!(ids, vec!["a1", "v1"]);
    }

    #[test]
    fn test_reconcile_removes_and_adds() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let a1 = stream.add_audio_track("a1").to_track();
        let v1 = stream.add_video_track("v1").to_track();
        registry.add_stream(&stream);

        // The stream stops reporting v1 and starts reporting v2
        stream.remove_track("v1");
        let v2 = stream.add_video_track("v2").to_track();

        let result = registry.reconcile([&stream]);

        assert_eq!(result, Reconciliation { added: 1, removed: 1 });
        assert!(registry.contains("a1"));
        assert!(!registry.contains("v1"));
        assert_eq!(registry.get("v2"), Some(v2));
        assert_eq!(registry.get("a1"), Some(a1));
        assert!(v1.media_stream().is_some());
        assert_invariants(&registry);
    }

    #[test]
    fn test_reconcile_drops_tracks_of_unknown_streams() {
        let registry = TrackRegistry::default();
        let s1 = MediaStream::new("s1");
        let s2 = MediaStream::new("s2");
        s1.add_audio_track("a1");
        s2.add_video_track("v2");
        registry.add_stream(&s1);
        registry.add_stream(&s2);

        let result = registry.reconcile([&s1]);

        assert_eq!(result.removed, 1);
        assert_eq!(registry.media_streams(), vec![s1]);
        assert_invariants(&registry);
    }

    #[test]
    fn test_refresh_uses_known_streams() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let a1 = stream.add_audio_track("a1").to_track();
        registry.add(&a1);

        // Missed add notification
        stream.add_video_track("v1");
        // Missed remove notification
        stream.remove_track("a1");

        let result = registry.refresh();

        assert_eq!(result, Reconciliation { added: 1, removed: 1 });
        assert!(registry.contains("v1"));
        assert!(!registry.contains("a1"));
        assert_eq!(registry.media_streams(), vec![stream]);
    }

    #[test]
    fn test_invariants_hold_across_mutations() {
        let registry = TrackRegistry::default();
        let streams: Vec<MediaStream> = (0..3).map(|i| MediaStream::new(format!("s{i}"))).collect();
        let tracks: Vec<Track> = (0..12)
            .map(|i| {
                let stream = &streams[i % streams.len()];
                if i % 2 == 0 {
                    AudioTrack::new(format!("t{i}"), stream).to_track()
                } else {
                    VideoTrack::new(format!("t{i}"), stream).to_track()
                }
            })
            .collect();

        // Deterministic pseudo-random walk over add/remove
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let track = &tracks[(seed % tracks.len() as u64) as usize];
            if seed & 0x100 == 0 {
                registry.add(track);
            } else {
                registry.remove(track);
            }
            assert_invariants(&registry);
        }
    }

    #[test]
    fn test_track_whose_stream_is_gone() {
        let registry = TrackRegistry::default();
        let kept = MediaStream::new("kept");
        let a1 = kept.add_audio_track("a1").to_track();
        let orphan: Track = {
            let gone = MediaStream::new("gone");
            VideoTrack::new("v1", &gone).into()
        };

        assert!(registry.add(&a1));
        assert!(registry.add(&orphan));

        // Registered, but contributes no backing stream
        assert_eq!(registry.video_tracks(), vec![orphan.clone()]);
        assert_eq!(registry.media_streams(), vec![kept.clone()]);
        assert_invariants(&registry);

        registry.remove(&a1);
        assert!(registry.media_streams().is_empty());
        assert_eq!(registry.len(), 1);
        assert_invariants(&registry);
    }

    #[test]
    fn test_removal_inside_removed_listener_is_reported() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let a1 = stream.add_audio_track("a1").to_track();
        let v1 = stream.add_video_track("v1").to_track();
        registry.add(&a1);
        registry.add(&v1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let inner = registry.clone();
        let follow = v1.clone();
        registry.events().on(MediaEventKind::TrackRemoved, move |track| {
            s.borrow_mut().push(track.id().to_string());
            if track.id() == "a1" {
                inner.remove(&follow);
            }
        });

        registry.remove(&a1);

        assert!(registry.is_empty());
        assert_eq!(*seen.borrow(), vec!["a1", "v1"]);
        assert_invariants(&registry);
    }

    #[test]
    fn test_stats() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        stream.add_audio_track("a1");
        stream.add_video_track("v1");
        stream.add_video_track("v2");
        registry.add_stream(&stream);

        let stats = registry.stats();
        assert_eq!(stats.track_count, 3);
        assert_eq!(stats.audio_count, 1);
        assert_eq!(stats.video_count, 2);
        assert_eq!(stats.stream_count, 1);
        assert!(!stats.is_muted);
        assert!(!stats.is_paused);
    }
}
