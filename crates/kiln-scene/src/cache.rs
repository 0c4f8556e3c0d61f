//! Template cache
//!
//! Maps asset references to immutable, shared scene templates. Concurrent
//! requests for one reference wait on the same load. Failed loads are not
//! remembered, so a later request tries again.

use crate::graph::SceneGraph;
use crate::loader::{is_loadable_model, MockShape, SceneLoader};
use kiln_core::{KilnError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// A resolved scene, never mutated after construction
#[derive(Debug)]
pub struct SceneTemplate {
    reference: String,
    graph: SceneGraph,
    mock: Option<MockShape>,
}

impl SceneTemplate {
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The primitive used when the reference was not a loadable model
    pub fn mock_shape(&self) -> Option<MockShape> {
        self.mock
    }
}

type Slot = Arc<OnceLock<std::result::Result<Arc<SceneTemplate>, String>>>;

#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: Mutex<HashMap<String, Slot>>,
    loads: AtomicUsize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the template for `reference`, loading it at most once.
    ///
    /// Loadable model references go through `loader`; everything else
    /// resolves to a mock primitive.
    pub fn get_or_load(&self, reference: &str, loader: &dyn SceneLoader) -> Result<Arc<SceneTemplate>> {
        let slot = {
            let mut slots = self.lock_slots()?;
            Arc::clone(slots.entry(reference.to_string()).or_default())
        };

        let outcome = slot.get_or_init(|| self.load(reference, loader));

        match outcome {
            Ok(template) => Ok(Arc::clone(template)),
            Err(message) => {
                let mut slots = self.lock_slots()?;
                if slots.get(reference).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    slots.remove(reference);
                }
                Err(KilnError::SceneError(message.clone()))
            }
        }
    }

    fn load(
        &self,
        reference: &str,
        loader: &dyn SceneLoader,
    ) -> std::result::Result<Arc<SceneTemplate>, String> {
        if !is_loadable_model(reference) {
            let shape = MockShape::for_reference(reference);
            tracing::debug!(reference, %shape, "using mock geometry");
            return Ok(Arc::new(SceneTemplate {
                reference: reference.to_string(),
                graph: shape.scene(),
                mock: Some(shape),
            }));
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        match loader.load(reference) {
            Ok(graph) => {
                tracing::info!(
                    reference,
                    nodes = graph.node_count(),
                    surfaces = graph.surface_count(),
                    "scene template loaded"
                );
                Ok(Arc::new(SceneTemplate {
                    reference: reference.to_string(),
                    graph,
                    mock: None,
                }))
            }
            Err(e) => {
                tracing::warn!(reference, error = %e, "scene load failed");
                Err(e.to_string())
            }
        }
    }

    /// Number of loader invocations so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.lock_slots()
            .map(|s| s.get(reference).is_some_and(|slot| matches!(slot.get(), Some(Ok(_)))))
            .unwrap_or(false)
    }

    /// Drop the cached template; instances already bound keep their copy
    pub fn evict(&self, reference: &str) -> bool {
        self.lock_slots()
            .map(|mut s| s.remove(reference).is_some())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut slots) = self.lock_slots() {
            slots.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lock_slots().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Slot>>> {
        self.slots
            .lock()
            .map_err(|_| KilnError::SceneError("template cache lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingLoader;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_loads_once() {
        let cache = TemplateCache::new();
        let loader = CountingLoader::new();

        let a = cache.get_or_load("chair.glb", &loader).unwrap();
        let b = cache.get_or_load("chair.glb", &loader).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.loads(), 1);
        assert_eq!(cache.load_count(), 1);
        assert!(cache.contains("chair.glb"));
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::with_delay(Duration::from_millis(50));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loader = loader.clone();
                thread::spawn(move || cache.get_or_load("table.glb", &loader).unwrap())
            })
            .collect();

        let templates: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(loader.loads(), 1);
        assert!(templates.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_mock_references_skip_loader() {
        let cache = TemplateCache::new();
        let loader = CountingLoader::new();

        let template = cache.get_or_load("/placeholder-model.glb", &loader).unwrap();
        assert_eq!(template.mock_shape(), Some(MockShape::Cube));
        assert_eq!(loader.loads(), 0);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let cache = TemplateCache::new();
        let loader = CountingLoader::new();

        assert!(cache.get_or_load("missing.glb", &loader).is_err());
        assert!(!cache.contains("missing.glb"));
        assert!(cache.get_or_load("missing.glb", &loader).is_err());
        assert_eq!(loader.loads(), 2);
    }

    #[test]
    fn test_evict_and_clear() {
        let cache = TemplateCache::new();
        let loader = CountingLoader::new();

        cache.get_or_load("a.glb", &loader).unwrap();
        cache.get_or_load("b.glb", &loader).unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.evict("a.glb"));
        assert!(!cache.evict("a.glb"));
        cache.get_or_load("a.glb", &loader).unwrap();
        assert_eq!(loader.loads(), 3);

        cache.clear();
        assert!(cache.is_empty());
    }
}
