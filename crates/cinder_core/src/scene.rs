//! Scene: a named root object plus a write lock for passes that must not
//! race with scene edits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SceneError;
use crate::light::LightComponent;
use crate::object::SceneObject;

#[derive(Debug)]
pub struct Scene {
    name: String,
    root: Option<Arc<SceneObject>>,
    write_locked: AtomicBool,
}

impl Scene {
    pub fn new(name: impl Into<String>, root: Arc<SceneObject>) -> Self {
        Self {
            name: name.into(),
            root: Some(root),
            write_locked: AtomicBool::new(false),
        }
    }

    /// A scene without a root object. Passes refuse to run on it.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            write_locked: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<&Arc<SceneObject>> {
        self.root.as_ref()
    }

    /// All light components in the graph, depth-first from the root.
    pub fn light_components(&self) -> Vec<Arc<LightComponent>> {
        let mut lights = Vec::new();
        let mut stack: Vec<Arc<SceneObject>> = self.root.iter().cloned().collect();
        while let Some(object) = stack.pop() {
            lights.extend(object.lights());
            // Reversed so the first child is popped first
            stack.extend(object.children().into_iter().rev());
        }
        lights
    }

    pub fn is_write_locked(&self) -> bool {
        self.write_locked.load(Ordering::Acquire)
    }

    /// Take the write lock for the lifetime of the returned guard.
    pub fn lock_for_write(&self) -> Result<SceneWriteGuard<'_>, SceneError> {
        self.write_locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SceneError::WriteLocked(self.name.clone()))?;
        Ok(SceneWriteGuard { scene: self })
    }
}

/// Releases the scene write lock on drop.
#[derive(Debug)]
pub struct SceneWriteGuard<'a> {
    scene: &'a Scene,
}

impl Drop for SceneWriteGuard<'_> {
    fn drop(&mut self) {
        self.scene.write_locked.store(false, Ordering::Release);
    }
}
