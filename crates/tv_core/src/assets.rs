//! Fire-and-forget image loading.
//!
//! Scenes call `AssetLoader::load(path)` and get an `ImageHandle` back
//! immediately. The host drains `take_pending()` between frames, decodes the
//! file and flips the handle to loaded (or failed). Nothing in the game loop
//! ever waits on a load; callers check `is_loaded()` and draw a placeholder
//! until then. A failed load stays failed for the lifetime of the process.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Loaded { width: u32, height: u32 },
    Failed,
}

#[derive(Debug)]
struct ImageSlot {
    path: String,
    state: Cell<ImageState>,
}

/// Shared handle to one image. Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct ImageHandle(Rc<ImageSlot>);

impl ImageHandle {
    fn new(path: &str) -> Self {
        Self(Rc::new(ImageSlot {
            path: path.to_string(),
            state: Cell::new(ImageState::Pending),
        }))
    }

    /// Handle that is already decoded; used by tests and generated textures.
    pub fn preloaded(path: &str, width: u32, height: u32) -> Self {
        let handle = Self::new(path);
        handle.mark_loaded(width, height);
        handle
    }

    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn state(&self) -> ImageState {
        self.0.state.get()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state(), ImageState::Loaded { .. })
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        match self.state() {
            ImageState::Loaded { width, height } => Some((width, height)),
            _ => None,
        }
    }

    pub fn mark_loaded(&self, width: u32, height: u32) {
        if self.state() == ImageState::Failed {
            return;
        }
        self.0.state.set(ImageState::Loaded { width, height });
    }

    pub fn mark_failed(&self) {
        self.0.state.set(ImageState::Failed);
    }

    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Default)]
struct LoaderInner {
    cache: HashMap<String, ImageHandle>,
    pending: Vec<ImageHandle>,
}

/// Per-path cache of image handles plus the queue of loads the host has not
/// serviced yet. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct AssetLoader {
    inner: Rc<RefCell<LoaderInner>>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an image. Repeated requests for the same path share one handle,
    /// so a sheet used by many enemies is decoded once.
    pub fn load(&self, path: &str) -> ImageHandle {
        let mut inner = self.inner.borrow_mut();
        if let Some(existing) = inner.cache.get(path) {
            return existing.clone();
        }
        let handle = ImageHandle::new(path);
        inner.cache.insert(path.to_string(), handle.clone());
        inner.pending.push(handle.clone());
        log::debug!("Queued image load: {path}");
        handle
    }

    /// Hand every not-yet-serviced request to the host.
    pub fn take_pending(&self) -> Vec<ImageHandle> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    pub fn cached_count(&self) -> usize {
        self.inner.borrow().cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_cached_per_path() {
        let loader = AssetLoader::new();
        let a = loader.load("assets/images/enemy.png");
        let b = loader.load("assets/images/enemy.png");
        assert!(a.ptr_eq(&b));
        assert_eq!(loader.cached_count(), 1);
        assert_eq!(loader.pending_count(), 1);
    }

    #[test]
    fn take_pending_drains_queue() {
        let loader = AssetLoader::new();
        loader.load("a.png");
        loader.load("b.png");
        let pending = loader.take_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(loader.pending_count(), 0);
        // Already cached, so no new request is queued.
        loader.load("a.png");
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn host_completion_is_visible_through_clones() {
        let loader = AssetLoader::new();
        let handle = loader.load("hero.png");
        assert!(!handle.is_loaded());
        for pending in loader.take_pending() {
            pending.mark_loaded(64, 32);
        }
        assert!(handle.is_loaded());
        assert_eq!(handle.size(), Some((64, 32)));
    }

    #[test]
    fn failure_is_terminal() {
        let handle = ImageHandle::new("missing.png");
        handle.mark_failed();
        handle.mark_loaded(10, 10);
        assert_eq!(handle.state(), ImageState::Failed);
        assert!(!handle.is_loaded());
    }
}
