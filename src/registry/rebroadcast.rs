//! Track signal rebroadcast
//!
//! When a track is registered, each of its lifecycle signals is wired to
//! the matching aggregate event. The listeners hold only weak references to
//! the registry and dispose themselves the first time they fire for a track
//! that is no longer registered under the registration they were wired
//! for. A removed-then-re-added track therefore republishes every signal
//! exactly once: through the fresh listeners, while the stale ones drop out.

use std::ops::ControlFlow;
use std::rc::Rc;

use super::entry::Registration;
use super::store::TrackRegistry;
use crate::event::MediaEventKind;
use crate::track::{Track, TrackSignal};

/// Signal → aggregate event routing
const FORWARDED: [(TrackSignal, MediaEventKind); 5] = [
    (TrackSignal::DimensionsChanged, MediaEventKind::TrackDimensionsChanged),
    (TrackSignal::Disabled, MediaEventKind::TrackDisabled),
    (TrackSignal::Enabled, MediaEventKind::TrackEnabled),
    (TrackSignal::Ended, MediaEventKind::TrackEnded),
    (TrackSignal::Started, MediaEventKind::TrackStarted),
];

/// Wire `track`'s signals to the registry's aggregate events
pub(super) fn wire(registry: &TrackRegistry, track: &Track, registration: Registration) {
    for (signal, event) in FORWARDED {
        let state = Rc::downgrade(&registry.state);
        let events = Rc::downgrade(&registry.events);

        track.subscribe(signal, move |track| {
            let (Some(state), Some(events)) = (state.upgrade(), events.upgrade()) else {
                return ControlFlow::Break(());
            };

            if !state.borrow().is_current(track, registration) {
                tracing::debug!(
                    track = track.id(),
                    signal = ?signal,
                    "Dropping listener of unregistered track"
                );
                return ControlFlow::Break(());
            }

            events.emit(event, track);
            ControlFlow::Continue(())
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::track::{Dimensions, MediaStream};

    fn record_all(registry: &TrackRegistry) -> Rc<RefCell<Vec<(MediaEventKind, String)>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in MediaEventKind::ALL {
            let seen = Rc::clone(&seen);
            registry
                .events()
                .on(kind, move |t| seen.borrow_mut().push((kind, t.id().to_string())));
        }
        seen
    }

    #[test]
    fn test_signals_are_republished() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let video = stream.add_video_track("v1");
        let track = video.to_track();
        registry.add(&track);

        let seen = record_all(&registry);
        track.start();
        video.set_dimensions(Dimensions::new(320, 240));
        track.set_enabled(false);
        track.set_enabled(true);
        track.end();

        let kinds: Vec<MediaEventKind> = seen.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                MediaEventKind::TrackStarted,
                MediaEventKind::TrackDimensionsChanged,
                MediaEventKind::TrackDisabled,
                MediaEventKind::TrackEnabled,
                MediaEventKind::TrackEnded,
            ]
        );
    }

    #[test]
    fn test_removed_track_is_silent_and_cleaned_up() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let track = stream.add_audio_track("a1").to_track();
        registry.add(&track);
        assert_eq!(track.listener_count(TrackSignal::Disabled), 1);

        registry.remove(&track);
        let seen = record_all(&registry);
        track.set_enabled(false);

        assert!(seen.borrow().is_empty());
        // The listener removed itself on its first late firing
        assert_eq!(track.listener_count(TrackSignal::Disabled), 0);
        assert_eq!(track.listener_count(TrackSignal::Enabled), 1);
    }

    #[test]
    fn test_readded_track_republishes_once() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let track = stream.add_audio_track("a1").to_track();

        registry.add(&track);
        registry.remove(&track);
        registry.add(&track);

        let seen = record_all(&registry);
        track.set_enabled(false);
        track.set_enabled(true);

        assert_eq!(
            *seen.borrow(),
            vec![
                (MediaEventKind::TrackDisabled, "a1".to_string()),
                (MediaEventKind::TrackEnabled, "a1".to_string()),
            ]
        );
        assert_eq!(track.listener_count(TrackSignal::Disabled), 1);
    }

    #[test]
    fn test_replaced_instance_is_silent() {
        let registry = TrackRegistry::default();
        let stream = MediaStream::new("s1");
        let old = stream.add_video_track("v1").to_track();
        registry.add(&old);
        registry.remove(&old);

        let replacement = crate::track::VideoTrack::new("v1", &stream).to_track();
        registry.add(&replacement);

        let seen = record_all(&registry);
        old.end();
        assert!(seen.borrow().is_empty());

        replacement.end();
        assert_eq!(
            *seen.borrow(),
            vec![(MediaEventKind::TrackEnded, "v1".to_string())]
        );
    }

    #[test]
    fn test_listeners_outliving_registry_dispose() {
        let stream = MediaStream::new("s1");
        let track = stream.add_audio_track("a1").to_track();
        {
            let registry = TrackRegistry::default();
            registry.add(&track);
        }

        track.set_enabled(false);
        assert_eq!(track.listener_count(TrackSignal::Disabled), 0);
    }
}
