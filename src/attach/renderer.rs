//! Rendering surface capability
//!
//! The engine never touches a UI toolkit directly. Everything it needs to
//! create containers, find them, and put track elements into them goes
//! through a [`Renderer`] supplied by the application.

use std::fmt;
use std::hash::Hash;

use crate::track::Track;

/// Capability to create and place rendered track elements
pub trait Renderer: 'static {
    /// A surface elements are attached to (e.g. a container widget)
    type Surface: Clone + Eq + Hash + fmt::Debug + 'static;

    /// A rendered track element (e.g. an audio or video sink)
    type Element: 'static;

    /// Create a fresh, empty surface
    fn create_container(&self) -> Self::Surface;

    /// Look up an existing surface by query
    fn resolve(&self, query: &str) -> Option<Self::Surface>;

    /// Create the element that renders `track`
    fn create_element(&self, track: &Track) -> Self::Element;

    /// Release an element created by [`Renderer::create_element`]
    fn destroy_element(&self, track: &Track, element: &Self::Element);

    /// Place `element` inside `surface`
    fn append(&self, surface: &Self::Surface, element: &Self::Element);

    /// Take `element` out of `surface`
    fn remove(&self, surface: &Self::Surface, element: &Self::Element);
}

/// Which surface(s) an attach or detach applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<S> {
    /// Attach: a newly created container. Detach: every attached surface.
    Default,
    /// A surface resolved through [`Renderer::resolve`]
    Selector(String),
    /// A surface supplied directly
    Surface(S),
}

impl<S> Target<S> {
    /// Target a surface resolved by query
    pub fn selector(query: impl Into<String>) -> Self {
        Target::Selector(query.into())
    }
}

/// Result of a detach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detached<S> {
    /// A single surface was targeted
    One(S),
    /// Every attached surface was detached, in attach order
    All(Vec<S>),
}

impl<S> Detached<S> {
    /// Detached surfaces as a list
    pub fn into_vec(self) -> Vec<S> {
        match self {
            Detached::One(surface) => vec![surface],
            Detached::All(surfaces) => surfaces,
        }
    }
}
