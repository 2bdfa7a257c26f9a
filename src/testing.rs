//! Test support: an in-memory renderer that records what it was asked to do

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::attach::Renderer;
use crate::track::{Track, TrackKind};

/// Install a test subscriber honoring `RUST_LOG`
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestElement {
    pub serial: u32,
    pub track: String,
    pub kind: TrackKind,
}

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    next_serial: Cell<u32>,
    next_container: Cell<u32>,
    surfaces: RefCell<IndexMap<String, Vec<TestElement>>>,
    live: RefCell<HashSet<u32>>,
    created: Cell<usize>,
    destroyed: Cell<usize>,
    on_append: RefCell<Option<Box<dyn FnOnce(&str)>>>,
}

impl RecordingRenderer {
    /// A renderer that already knows the named surfaces
    pub fn with_surfaces(names: &[&str]) -> Self {
        let renderer = Self::default();
        for name in names {
            renderer
                .surfaces
                .borrow_mut()
                .insert(name.to_string(), Vec::new());
        }
        renderer
    }

    /// Track ids currently placed in `surface`, in placement order
    pub fn children(&self, surface: &str) -> Vec<String> {
        self.surfaces
            .borrow()
            .get(surface)
            .map(|elements| elements.iter().map(|e| e.track.clone()).collect())
            .unwrap_or_default()
    }

    /// Run `hook` right after the next element is appended to a surface
    pub fn on_next_append(&self, hook: impl FnOnce(&str) + 'static) {
        *self.on_append.borrow_mut() = Some(Box::new(hook));
    }

    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.get()
    }

    /// Elements created and not yet destroyed
    pub fn live(&self) -> usize {
        self.live.borrow().len()
    }
}

impl Renderer for RecordingRenderer {
    type Surface = String;
    type Element = TestElement;

    fn create_container(&self) -> String {
        let n = self.next_container.get() + 1;
        self.next_container.set(n);
        let name = format!("container-{n}");
        self.surfaces.borrow_mut().insert(name.clone(), Vec::new());
        name
    }

    fn resolve(&self, query: &str) -> Option<String> {
        self.surfaces
            .borrow()
            .contains_key(query)
            .then(|| query.to_string())
    }

    fn create_element(&self, track: &Track) -> TestElement {
        let serial = self.next_serial.get() + 1;
        self.next_serial.set(serial);
        self.created.set(self.created.get() + 1);
        self.live.borrow_mut().insert(serial);
        TestElement {
            serial,
            track: track.id().to_string(),
            kind: track.kind(),
        }
    }

    fn destroy_element(&self, _track: &Track, element: &TestElement) {
        assert!(
            self.live.borrow_mut().remove(&element.serial),
            "element {} destroyed twice",
            element.serial
        );
        self.destroyed.set(self.destroyed.get() + 1);
    }

    fn append(&self, surface: &String, element: &TestElement) {
        self.surfaces
            .borrow_mut()
            .entry(surface.clone())
            .or_default()
            .push(element.clone());

        let hook = self.on_append.borrow_mut().take();
        if let Some(hook) = hook {
            hook(surface.as_str());
        }
    }

    fn remove(&self, surface: &String, element: &TestElement) {
        if let Some(elements) = self.surfaces.borrow_mut().get_mut(surface) {
            elements.retain(|e| e.serial != element.serial);
        }
    }
}
