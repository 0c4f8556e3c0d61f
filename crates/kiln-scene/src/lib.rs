//! Kiln Scene - asset binding engine
//!
//! Resolves asset references to scene graphs through a memoizing
//! `TemplateCache`, gives every binder its own `SceneInstance` copy and
//! patches surface materials on that copy whenever the configuration changes.
//! References that are not loadable model files get a mock primitive.

mod binder;
mod cache;
mod gltf_loader;
mod graph;
mod loader;
mod primitives;
mod texture;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use binder::{AssetBinder, BindOutcome, ResolvedScene, SceneInstance, SceneSummary};
pub use cache::{SceneTemplate, TemplateCache};
pub use gltf_loader::load_gltf;
pub use graph::{Mesh, SceneGraph, SceneNode, Surface, SurfaceMaterial, Vertex};
pub use loader::{is_loadable_model, GltfLoader, MockShape, SceneLoader};
pub use primitives::{create_box_mesh, create_capsule_mesh, create_sphere_mesh, create_torus_knot_mesh};
pub use texture::{load_color_texture, ColorSpace, Texture};
