//! Material binding
//!
//! An `AssetBinder` owns at most one `SceneInstance`: a private deep copy of
//! a cached template. Rebinding the same reference only patches materials on
//! that copy; a new reference replaces the instance.

use crate::cache::{SceneTemplate, TemplateCache};
use crate::graph::SceneGraph;
use crate::loader::{MockShape, SceneLoader};
use crate::texture::{load_color_texture, Texture};
use kiln_core::{clamp_unit, KilnError, MaterialConfig, ReferenceToken, Result, Session};
use std::fmt;
use std::sync::Arc;

/// Counts reported for a bound scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub reference: String,
    pub nodes: usize,
    pub surfaces: usize,
    pub triangles: usize,
    pub mock_shape: Option<MockShape>,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reference = if self.reference.is_empty() { "<none>" } else { &self.reference };
        write!(
            f,
            "{}: {} nodes, {} surfaces, {} triangles",
            reference, self.nodes, self.surfaces, self.triangles
        )?;
        if let Some(shape) = self.mock_shape {
            write!(f, " (mock {})", shape)?;
        }
        Ok(())
    }
}

/// A binder's private copy of a template
#[derive(Debug)]
pub struct SceneInstance {
    reference: String,
    graph: SceneGraph,
    mock: Option<MockShape>,
    texture: Option<Arc<Texture>>,
}

impl SceneInstance {
    fn from_template(template: &SceneTemplate) -> Self {
        Self {
            reference: template.reference().to_string(),
            graph: template.graph().clone(),
            mock: template.mock_shape(),
            texture: None,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn mock_shape(&self) -> Option<MockShape> {
        self.mock
    }

    /// Source of the color map currently assigned, if any
    pub fn texture_source(&self) -> Option<&str> {
        self.texture.as_ref().map(|t| t.source.as_str())
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            reference: self.reference.clone(),
            nodes: self.graph.node_count(),
            surfaces: self.graph.surface_count(),
            triangles: self.graph.triangle_count(),
            mock_shape: self.mock,
        }
    }

    fn patch(&mut self, config: &MaterialConfig) {
        match config.texture_reference() {
            Some(source) if self.texture_source() != Some(source) => {
                self.texture = match load_color_texture(source) {
                    Ok(texture) => Some(Arc::new(texture)),
                    Err(e) => {
                        tracing::warn!(reference = %self.reference, texture = source, error = %e, "texture not applied");
                        None
                    }
                };
            }
            Some(_) => {}
            None => self.texture = None,
        }

        let color = config.base_color();
        let roughness = clamp_unit(config.roughness());
        let metalness = clamp_unit(config.metalness());
        let texture = self.texture.clone();

        self.graph.for_each_surface_mut(|surface| {
            let material = &mut surface.material;
            material.base_color = color;
            material.roughness = roughness;
            material.metalness = metalness;
            material.color_map = texture.clone();
            material.needs_update = true;
        });
    }
}

impl Drop for SceneInstance {
    fn drop(&mut self) {
        tracing::debug!(reference = %self.reference, "scene instance released");
    }
}

/// A template resolved for a specific session reference, not yet applied
#[derive(Debug, Clone)]
pub struct ResolvedScene {
    token: ReferenceToken,
    template: Arc<SceneTemplate>,
}

impl ResolvedScene {
    pub fn token(&self) -> &ReferenceToken {
        &self.token
    }

    pub fn template(&self) -> &SceneTemplate {
        &self.template
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Applied,
    /// The session's reference changed while the template was loading
    Stale,
}

/// Binds asset references and material configurations to a scene instance
pub struct AssetBinder {
    cache: Arc<TemplateCache>,
    loader: Arc<dyn SceneLoader>,
    instance: Option<SceneInstance>,
}

impl AssetBinder {
    pub fn new(cache: Arc<TemplateCache>, loader: Arc<dyn SceneLoader>) -> Self {
        Self {
            cache,
            loader,
            instance: None,
        }
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn instance(&self) -> Option<&SceneInstance> {
        self.instance.as_ref()
    }

    /// Bind `reference` and apply `config` to every surface.
    ///
    /// The template is copied only when the reference differs from the one
    /// already bound.
    pub fn bind(&mut self, reference: &str, config: &MaterialConfig) -> Result<&SceneInstance> {
        if self.instance.as_ref().map(|i| i.reference()) != Some(reference) {
            let template = self.cache.get_or_load(reference, self.loader.as_ref())?;
            self.install(&template);
        }
        self.patch_current(config)
    }

    /// Load the template for `token` without touching the bound instance
    pub fn resolve(&self, token: &ReferenceToken) -> Result<ResolvedScene> {
        let template = self.cache.get_or_load(&token.reference, self.loader.as_ref())?;
        Ok(ResolvedScene {
            token: token.clone(),
            template,
        })
    }

    /// Apply a resolved load if the session still shows the same reference
    pub fn apply(&mut self, resolved: ResolvedScene, session: &Session) -> Result<BindOutcome> {
        if !session.is_current(&resolved.token) {
            tracing::warn!(
                reference = %resolved.token.reference,
                current = session.asset_reference().unwrap_or(""),
                "discarding stale scene load"
            );
            return Ok(BindOutcome::Stale);
        }

        if self.instance.as_ref().map(|i| i.reference()) != Some(resolved.token.reference.as_str()) {
            self.install(&resolved.template);
        }
        self.patch_current(session.material())?;
        Ok(BindOutcome::Applied)
    }

    /// Drop the bound instance
    pub fn release(&mut self) {
        self.instance = None;
    }

    fn install(&mut self, template: &SceneTemplate) {
        // Release the previous copy before building the next one
        self.instance = None;
        let instance = SceneInstance::from_template(template);
        tracing::info!(
            reference = %instance.reference,
            surfaces = instance.graph.surface_count(),
            "scene instance created"
        );
        self.instance = Some(instance);
    }

    fn patch_current(&mut self, config: &MaterialConfig) -> Result<&SceneInstance> {
        let instance = self
            .instance
            .as_mut()
            .ok_or_else(|| KilnError::SceneError("no scene bound".to_string()))?;
        instance.patch(config);
        Ok(&*instance)
    }
}

impl fmt::Debug for AssetBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetBinder")
            .field("cache", &self.cache)
            .field("instance", &self.instance.as_ref().map(|i| i.reference()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingLoader;
    use kiln_core::Rgb;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    fn binder(cache: &Arc<TemplateCache>, loader: &CountingLoader) -> AssetBinder {
        AssetBinder::new(Arc::clone(cache), Arc::new(loader.clone()))
    }

    fn write_texture(dir: &Path, name: &str) -> String {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 255]))
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_two_binders_share_one_load() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut a = binder(&cache, &loader);
        let mut b = binder(&cache, &loader);

        let red = MaterialConfig::new(Rgb::new(1.0, 0.0, 0.0), 0.1, 0.2);
        let blue = MaterialConfig::new(Rgb::new(0.0, 0.0, 1.0), 0.9, 0.8);

        a.bind("chair.glb", &red).unwrap();
        b.bind("chair.glb", &blue).unwrap();
        assert_eq!(loader.loads(), 1);

        let sa = a.instance().unwrap().graph().surfaces().next().unwrap().material.clone();
        let sb = b.instance().unwrap().graph().surfaces().next().unwrap().material.clone();
        assert_eq!(sa.base_color, Rgb::new(1.0, 0.0, 0.0));
        assert_eq!((sa.metalness, sa.roughness), (0.1, 0.2));
        assert_eq!(sb.base_color, Rgb::new(0.0, 0.0, 1.0));
        assert_eq!((sb.metalness, sb.roughness), (0.9, 0.8));
    }

    #[test]
    fn test_template_is_not_mutated() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        binder
            .bind("chair.glb", &MaterialConfig::new(Rgb::BLACK, 1.0, 0.0))
            .unwrap();

        let template = cache.get_or_load("chair.glb", &loader).unwrap();
        let material = &template.graph().surfaces().next().unwrap().material;
        assert_eq!(material.base_color, Rgb::WHITE);
        assert_eq!(material.roughness, 1.0);
        assert!(!material.needs_update);
    }

    #[test]
    fn test_every_surface_gets_clamped_values() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        let mut config = MaterialConfig::default();
        config.set_roughness(7.0);
        config.set_metalness(-1.0);
        let instance = binder.bind("chair.glb", &config).unwrap();

        assert!(instance.graph().surface_count() > 0);
        for surface in instance.graph().surfaces() {
            assert_eq!(surface.material.roughness, 1.0);
            assert_eq!(surface.material.metalness, 0.0);
            assert!(surface.material.needs_update);
        }
    }

    #[test]
    fn test_material_update_keeps_instance() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        binder.bind("chair.glb", &MaterialConfig::default()).unwrap();
        let mut config = MaterialConfig::default();
        config.set_roughness(0.05);
        let instance = binder.bind("chair.glb", &config).unwrap();

        assert_eq!(instance.reference(), "chair.glb");
        assert!(instance.graph().surfaces().all(|s| s.material.roughness == 0.05));
        assert_eq!(loader.loads(), 1);
    }

    #[test]
    fn test_texture_assignment() {
        let dir = std::env::temp_dir().join(format!("kiln_binder_test_{}", uuid::Uuid::new_v4()));
        let texture = write_texture(&dir, "wood.png");

        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        let config = MaterialConfig::default().with_texture(texture.clone());
        let instance = binder.bind("chair.glb", &config).unwrap();
        assert_eq!(instance.texture_source(), Some(texture.as_str()));
        for surface in instance.graph().surfaces() {
            let map = surface.material.color_map.as_ref().unwrap();
            assert_eq!(map.color_space, crate::texture::ColorSpace::Srgb);
            assert!(!map.flip_y);
            assert_eq!((map.width, map.height), (4, 4));
        }

        let instance = binder.bind("chair.glb", &MaterialConfig::default()).unwrap();
        assert!(instance.texture_source().is_none());
        assert!(instance.graph().surfaces().all(|s| s.material.color_map.is_none()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unreadable_texture_is_skipped() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        let config = MaterialConfig::new(Rgb::BLACK, 0.3, 0.3).with_texture("/nonexistent/kiln/t.png");
        let instance = binder.bind("chair.glb", &config).unwrap();
        assert!(instance.texture_source().is_none());
        assert!(instance.graph().surfaces().all(|s| s.material.metalness == 0.3));
    }

    #[test]
    fn test_placeholder_references_bind_mock_shapes() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);
        let config = MaterialConfig::default();

        let cases = [
            ("/placeholder-model-from-video.glb", MockShape::Capsule),
            ("/placeholder-model-from-image.glb", MockShape::Sphere),
            ("/placeholder-model.glb", MockShape::Cube),
            ("", MockShape::Cube),
            ("something-else", MockShape::TorusKnot),
        ];
        for (reference, shape) in cases {
            let summary = binder.bind(reference, &config).unwrap().summary();
            assert_eq!(summary.mock_shape, Some(shape), "{}", reference);
            assert_eq!(summary.nodes, 1);
        }
        assert_eq!(loader.loads(), 0);
    }

    #[test]
    fn test_failed_load_keeps_previous_instance() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        binder.bind("chair.glb", &MaterialConfig::default()).unwrap();
        let err = binder.bind("missing.glb", &MaterialConfig::default()).unwrap_err();
        assert!(matches!(err, KilnError::SceneError(_)));
        assert_eq!(binder.instance().unwrap().reference(), "chair.glb");
    }

    #[test]
    fn test_stale_resolve_is_discarded() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        let mut session = Session::new();
        session.set_asset_reference(Some("first.glb".into()));
        let resolved = binder.resolve(&session.reference_token()).unwrap();

        session.set_asset_reference(Some("second.glb".into()));
        assert_eq!(binder.apply(resolved, &session).unwrap(), BindOutcome::Stale);
        assert!(binder.instance().is_none());

        let resolved = binder.resolve(&session.reference_token()).unwrap();
        assert_eq!(binder.apply(resolved, &session).unwrap(), BindOutcome::Applied);
        assert_eq!(binder.instance().unwrap().reference(), "second.glb");
    }

    #[test]
    fn test_concurrent_binds_load_once() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::with_delay(Duration::from_millis(50));

        let handles: Vec<_> = [0.2f32, 0.7]
            .into_iter()
            .map(|roughness| {
                let mut binder = binder(&cache, &loader);
                thread::spawn(move || {
                    let mut config = MaterialConfig::default();
                    config.set_roughness(roughness);
                    let instance = binder.bind("lamp.glb", &config).unwrap();
                    let applied = instance.graph().surfaces().next().unwrap().material.roughness;
                    applied
                })
            })
            .collect();

        let applied: Vec<f32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(applied, vec![0.2, 0.7]);
        assert_eq!(loader.loads(), 1);
    }

    #[test]
    fn test_release_and_summary() {
        let cache = Arc::new(TemplateCache::new());
        let loader = CountingLoader::new();
        let mut binder = binder(&cache, &loader);

        let summary = binder.bind("chair.glb", &MaterialConfig::default()).unwrap().summary();
        assert_eq!(summary.reference, "chair.glb");
        assert_eq!(summary.mock_shape, None);
        assert_eq!(summary.triangles, 100 * 16 * 2);
        assert!(summary.to_string().starts_with("chair.glb: 1 nodes"));

        binder.release();
        assert!(binder.instance().is_none());
    }
}
