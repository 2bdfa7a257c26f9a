//! Console rendering example
//!
//! Run with: cargo run --example console_render [SURFACE...]
//!
//! Examples:
//!   cargo run --example console_render                    # attaches to #remote-media
//!   cargo run --example console_render #main #sidebar     # attaches to two surfaces
//!   RUST_LOG=session_media=trace cargo run --example console_render
//!
//! Plays a short scripted session against a renderer that prints what it
//! is asked to show:
//!
//! - A remote stream arrives with an audio and a video track
//! - The remote side mutes, resizes its video and adds a screen share
//! - The camera track ends, and a missed removal is caught by a refresh
//! - Every surface is detached at the end

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use session_media::{
    Dimensions, Media, MediaEventKind, MediaStream, Renderer, Target, Track, TrackKind,
};

/// An element as printed on the console
#[derive(Debug, Clone)]
struct ConsoleElement {
    tag: &'static str,
    serial: u32,
    track: String,
}

impl std::fmt::Display for ConsoleElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} #{} track={}>", self.tag, self.serial, self.track)
    }
}

/// Renderer that prints every operation and tracks surface contents
struct ConsoleRenderer {
    next_serial: Cell<u32>,
    next_container: Cell<u32>,
    surfaces: RefCell<HashMap<String, Vec<u32>>>,
}

impl ConsoleRenderer {
    fn new(surfaces: &[String]) -> Self {
        Self {
            next_serial: Cell::new(0),
            next_container: Cell::new(0),
            surfaces: RefCell::new(
                surfaces
                    .iter()
                    .map(|name| (name.clone(), Vec::new()))
                    .collect(),
            ),
        }
    }

    fn print_surface(&self, surface: &str) {
        let surfaces = self.surfaces.borrow();
        let children = surfaces.get(surface).map(Vec::len).unwrap_or(0);
        println!("  {} holds {} element(s)", surface, children);
    }
}

impl Renderer for ConsoleRenderer {
    type Surface = String;
    type Element = ConsoleElement;

    fn create_container(&self) -> String {
        let n = self.next_container.get() + 1;
        self.next_container.set(n);
        let name = format!("div#container-{}", n);
        self.surfaces.borrow_mut().insert(name.clone(), Vec::new());
        println!("create {}", name);
        name
    }

    fn resolve(&self, query: &str) -> Option<String> {
        self.surfaces
            .borrow()
            .contains_key(query)
            .then(|| query.to_string())
    }

    fn create_element(&self, track: &Track) -> ConsoleElement {
        let serial = self.next_serial.get() + 1;
        self.next_serial.set(serial);
        ConsoleElement {
            tag: match track.kind() {
                TrackKind::Audio => "audio",
                TrackKind::Video => "video",
            },
            serial,
            track: track.id().to_string(),
        }
    }

    fn destroy_element(&self, _track: &Track, element: &ConsoleElement) {
        println!("destroy {}", element);
    }

    fn append(&self, surface: &String, element: &ConsoleElement) {
        println!("{} += {}", surface, element);
        self.surfaces
            .borrow_mut()
            .entry(surface.clone())
            .or_default()
            .push(element.serial);
    }

    fn remove(&self, surface: &String, element: &ConsoleElement) {
        println!("{} -= {}", surface, element);
        if let Some(children) = self.surfaces.borrow_mut().get_mut(surface) {
            children.retain(|serial| *serial != element.serial);
        }
    }
}

fn print_state(media: &Media<ConsoleRenderer>) {
    let stats = media.stats();
    println!(
        "state: tracks={} audio={} video={} streams={} muted={} paused={}",
        stats.track_count,
        stats.audio_count,
        stats.video_count,
        stats.stream_count,
        stats.is_muted,
        stats.is_paused,
    );
    for surface in media.attachments().attachments() {
        media.renderer().print_surface(&surface);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("session_media=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let surfaces = if args.is_empty() {
        vec!["#remote-media".to_string()]
    } else {
        args
    };

    let media = Media::new(ConsoleRenderer::new(&surfaces));
    let mut events = media.subscribe();

    media.on(MediaEventKind::TrackEnded, |track| {
        println!("[listener] {} track {} ended", track.kind(), track.id());
    });

    for surface in &surfaces {
        media.attach(Target::selector(surface.as_str()))?;
    }
    // A container nobody asked for by name
    let extra = media.attach(Target::Default)?;

    println!();
    println!("=== Remote stream arrives ===");
    let remote = MediaStream::new("remote");
    let mic = remote.add_audio_track("mic");
    let camera = remote.add_video_track("camera");
    media.add_stream(&remote);
    camera.to_track().start();
    print_state(&media);

    println!();
    println!("=== Remote mutes, camera resizes, screen share added ===");
    mic.to_track().set_enabled(false);
    camera.set_dimensions(Dimensions::new(1280, 720));
    let screen = remote.add_video_track("screen");
    media.add(&screen.to_track());
    print_state(&media);

    println!();
    println!("=== Camera ends, its removal is never signaled ===");
    camera.to_track().end();
    remote.remove_track("camera");
    let result = media.refresh();
    println!("refresh: added={} removed={}", result.added, result.removed);
    print_state(&media);

    println!();
    println!("=== Detach {} ===", extra);
    media.detach(Target::Surface(extra))?;
    print_state(&media);

    println!();
    println!("=== Detach everything ===");
    let detached = media.detach(Target::Default)?.into_vec();
    println!("detached: {:?}", detached);

    println!();
    println!("=== Event log ===");
    while let Ok(event) = events.try_recv() {
        println!("{:<24} {}", event.kind.as_str(), event.track.id());
    }

    Ok(())
}
