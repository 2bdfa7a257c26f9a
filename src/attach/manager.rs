//! Attachment manager
//!
//! Keeps every attached surface in sync with the registry. Each surface
//! owns a map from track to rendered element. The map is filled when the
//! surface is attached (tracks already registered) and on `trackAdded`
//! (tracks arriving later). It is drained on `trackRemoved`, on the track's
//! own `Ended` signal, or all at once on detach, whichever comes first.
//!
//! Per (track, surface) pair the rendering goes `unrendered → rendered →
//! removed` exactly once. Rendering checks map membership first, and
//! removal takes the entry out of the map before destroying the element,
//! so a second trigger finds nothing to do.
//!
//! The renderer may call back into the engine while it appends an element.
//! A rendering is only kept if, once the renderer returns, its surface is
//! still attached, the track is still registered, and no other rendering
//! of the pair got there first. Otherwise the new element is destroyed.

use std::cell::RefCell;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::renderer::{Detached, Renderer, Target};
use crate::error::{Error, Result};
use crate::event::{MediaEventKind, Subscription};
use crate::registry::TrackRegistry;
use crate::track::{Track, TrackSignal};

/// One rendered element and the listener that drops it when its track ends
struct Rendering<E> {
    element: E,
    on_ended: Subscription,
}

/// State of one attached surface
struct AttachmentPoint<R: Renderer> {
    rendered: IndexMap<Track, Rendering<R::Element>>,
    subscriptions: Vec<Subscription>,
}

impl<R: Renderer> AttachmentPoint<R> {
    fn new(subscriptions: Vec<Subscription>) -> Self {
        Self {
            rendered: IndexMap::new(),
            subscriptions,
        }
    }
}

struct ManagerInner<R: Renderer> {
    renderer: R,
    registry: TrackRegistry,
    points: RefCell<IndexMap<R::Surface, AttachmentPoint<R>>>,
}

impl<R: Renderer> ManagerInner<R> {
    fn is_attached(&self, surface: &R::Surface) -> bool {
        self.points.borrow().contains_key(surface)
    }

    /// Whether this very instance is the registered track for its id
    fn is_registered(&self, track: &Track) -> bool {
        self.registry.get(track.id()).as_ref() == Some(track)
    }

    /// Render `track` into `surface` unless it is already rendered there
    fn render(self: &Rc<Self>, surface: &R::Surface, track: &Track) {
        if !self.is_registered(track) {
            return;
        }
        {
            let points = self.points.borrow();
            match points.get(surface) {
                Some(point) if !point.rendered.contains_key(track) => {}
                _ => return,
            }
        }

        let element = track.attach(&self.renderer);
        self.renderer.append(surface, &element);

        let manager = Rc::downgrade(self);
        let target = surface.clone();
        let on_ended = track.once(TrackSignal::Ended, move |track| {
            if let Some(inner) = manager.upgrade() {
                inner.unrender(&target, track);
            }
        });

        let registered = self.is_registered(track);
        let mut points = self.points.borrow_mut();
        let vacant = points
            .get_mut(surface)
            .filter(|point| registered && !point.rendered.contains_key(track));
        if let Some(point) = vacant {
            point.rendered.insert(track.clone(), Rendering { element, on_ended });
            tracing::debug!(
                surface = ?surface,
                track = track.id(),
                kind = %track.kind(),
                "Rendered track"
            );
            return;
        }
        drop(points);

        // The renderer re-entered the engine and detached the surface,
        // removed the track, or rendered the pair first
        tracing::debug!(surface = ?surface, track = track.id(), "Discarding stale rendering");
        on_ended.unsubscribe();
        self.destroy(surface, track, &element);
    }

    /// Remove the rendering of `track` from `surface`, if any
    fn unrender(&self, surface: &R::Surface, track: &Track) {
        let rendering = self
            .points
            .borrow_mut()
            .get_mut(surface)
            .and_then(|point| point.rendered.shift_remove(track));
        let Some(rendering) = rendering else {
            return;
        };

        rendering.on_ended.unsubscribe();
        self.destroy(surface, track, &rendering.element);
        tracing::debug!(surface = ?surface, track = track.id(), "Removed track rendering");
    }

    fn destroy(&self, surface: &R::Surface, track: &Track, element: &R::Element) {
        track.detach(&self.renderer, element);
        self.renderer.remove(surface, element);
    }

    /// Subscribe `surface` to a registry event, disposing once it is detached
    fn follow(
        self: &Rc<Self>,
        surface: &R::Surface,
        kind: MediaEventKind,
        action: fn(&Rc<Self>, &R::Surface, &Track),
    ) -> Subscription {
        let manager: Weak<Self> = Rc::downgrade(self);
        let surface = surface.clone();

        self.registry.events().emitter(kind).subscribe(move |track| {
            let Some(inner) = manager.upgrade() else {
                return ControlFlow::Break(());
            };
            if !inner.is_attached(&surface) {
                tracing::debug!(surface = ?surface, event = %kind, "Dropping listener of detached surface");
                return ControlFlow::Break(());
            }
            action(&inner, &surface, track);
            ControlFlow::Continue(())
        })
    }
}

/// Keeps rendering surfaces synchronized with a [`TrackRegistry`]
///
/// Cheap to clone; clones manage the same set of surfaces.
pub struct AttachmentManager<R: Renderer> {
    inner: Rc<ManagerInner<R>>,
}

impl<R: Renderer> AttachmentManager<R> {
    /// Create a manager following `registry`
    pub fn new(registry: TrackRegistry, renderer: R) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                renderer,
                registry,
                points: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// The rendering capability
    pub fn renderer(&self) -> &R {
        &self.inner.renderer
    }

    /// Attach to a surface and keep it in sync from now on
    ///
    /// Attaching a surface that is already attached returns it unchanged.
    /// Fails with [`Error::NotFound`] if a selector resolves to nothing.
    pub fn attach(&self, target: Target<R::Surface>) -> Result<R::Surface> {
        let surface = match target {
            Target::Default => self.inner.renderer.create_container(),
            Target::Selector(query) => self.resolve(&query)?,
            Target::Surface(surface) => surface,
        };
        Ok(self.attach_surface(surface))
    }

    /// Detach from one surface, or from all of them with [`Target::Default`]
    ///
    /// Detaching a surface that is not attached returns it unchanged.
    /// Fails with [`Error::NotFound`] if a selector resolves to nothing.
    pub fn detach(&self, target: Target<R::Surface>) -> Result<Detached<R::Surface>> {
        match target {
            Target::Default => Ok(Detached::All(self.detach_all())),
            Target::Selector(query) => {
                let surface = self.resolve(&query)?;
                Ok(Detached::One(self.detach_surface(surface)))
            }
            Target::Surface(surface) => Ok(Detached::One(self.detach_surface(surface))),
        }
    }

    /// Attached surfaces in attach order
    pub fn attachments(&self) -> Vec<R::Surface> {
        self.inner.points.borrow().keys().cloned().collect()
    }

    /// Whether `surface` is attached
    pub fn is_attached(&self, surface: &R::Surface) -> bool {
        self.inner.is_attached(surface)
    }

    /// Tracks rendered into `surface`, in render order
    pub fn rendered(&self, surface: &R::Surface) -> Vec<Track> {
        self.inner
            .points
            .borrow()
            .get(surface)
            .map(|point| point.rendered.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn resolve(&self, query: &str) -> Result<R::Surface> {
        self.inner
            .renderer
            .resolve(query)
            .ok_or_else(|| Error::NotFound {
                selector: query.to_string(),
            })
    }

    fn attach_surface(&self, surface: R::Surface) -> R::Surface {
        let inner = &self.inner;
        if inner.is_attached(&surface) {
            return surface;
        }

        // Follow the registry before rendering, so tracks the renderer adds
        // while the existing ones are rendered are not missed
        let subscriptions = vec![
            inner.follow(&surface, MediaEventKind::TrackAdded, |inner, surface, track| {
                inner.render(surface, track)
            }),
            inner.follow(&surface, MediaEventKind::TrackRemoved, |inner, surface, track| {
                inner.unrender(surface, track)
            }),
        ];
        inner
            .points
            .borrow_mut()
            .insert(surface.clone(), AttachmentPoint::new(subscriptions));

        for track in inner.registry.tracks() {
            inner.render(&surface, &track);
        }

        tracing::info!(
            surface = ?surface,
            tracks = self.rendered(&surface).len(),
            attached = inner.is_attached(&surface),
            "Attached surface"
        );
        surface
    }

    fn detach_surface(&self, surface: R::Surface) -> R::Surface {
        let point = self.inner.points.borrow_mut().shift_remove(&surface);
        let Some(point) = point else {
            return surface;
        };

        for subscription in &point.subscriptions {
            subscription.unsubscribe();
        }
        let count = point.rendered.len();
        for (track, rendering) in point.rendered {
            rendering.on_ended.unsubscribe();
            self.inner.destroy(&surface, &track, &rendering.element);
        }

        tracing::info!(surface = ?surface, tracks = count, "Detached surface");
        surface
    }

    fn detach_all(&self) -> Vec<R::Surface> {
        self.attachments()
            .into_iter()
            .map(|surface| self.detach_surface(surface))
            .collect()
    }
}

impl<R: Renderer> Clone for AttachmentManager<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Renderer> fmt::Debug for AttachmentManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentManager")
            .field("attachments", &self.attachments())
            .finish()
    }
}
