//! Asset reference resolution

use crate::gltf_loader::load_gltf;
use crate::graph::{Mesh, SceneGraph, SceneNode, Surface, SurfaceMaterial};
use crate::primitives::*;
use kiln_core::Result;
use std::fmt;
use std::sync::Arc;

const PLACEHOLDER_MARKER: &str = "placeholder";

/// Turns a loadable asset reference into a scene graph
pub trait SceneLoader: Send + Sync {
    fn load(&self, reference: &str) -> Result<SceneGraph>;
}

/// Loads `.glb` / `.gltf` files from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct GltfLoader;

impl SceneLoader for GltfLoader {
    fn load(&self, reference: &str) -> Result<SceneGraph> {
        load_gltf(reference)
    }
}

/// True for references that name an external model file. Placeholder
/// references are never loadable even though they end in `.glb`.
pub fn is_loadable_model(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    let model_file = lower.ends_with(".glb") || lower.ends_with(".gltf");
    model_file && !lower.contains(PLACEHOLDER_MARKER)
}

/// Primitive shown in place of a model that cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockShape {
    Cube,
    Sphere,
    Capsule,
    TorusKnot,
}

impl MockShape {
    /// Pick the stand-in for a reference:
    /// `video` -> capsule, `image` -> sphere, empty or placeholder -> cube,
    /// anything else -> torus knot.
    pub fn for_reference(reference: &str) -> Self {
        let lower = reference.to_ascii_lowercase();
        if lower.contains("video") {
            MockShape::Capsule
        } else if lower.contains("image") {
            MockShape::Sphere
        } else if lower.trim().is_empty() || lower.contains(PLACEHOLDER_MARKER) {
            MockShape::Cube
        } else {
            MockShape::TorusKnot
        }
    }

    pub fn mesh(&self) -> Mesh {
        match self {
            MockShape::Cube => create_box_mesh(1.0, 1.0, 1.0),
            MockShape::Sphere => create_sphere_mesh(0.7, 64, 64),
            MockShape::Capsule => create_capsule_mesh(0.5, 1.0, 4, 8),
            MockShape::TorusKnot => create_torus_knot_mesh(0.5, 0.2, 100, 16, 2, 3),
        }
    }

    /// A one-node scene holding this shape
    pub fn scene(&self) -> SceneGraph {
        let surface = Surface {
            mesh: Arc::new(self.mesh()),
            material: SurfaceMaterial::new(format!("mock-{}", self)),
        };
        SceneGraph::new(vec![SceneNode::new(format!("mock-{}", self)).with_surface(surface)])
    }
}

impl fmt::Display for MockShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockShape::Cube => write!(f, "cube"),
            MockShape::Sphere => write!(f, "sphere"),
            MockShape::Capsule => write!(f, "capsule"),
            MockShape::TorusKnot => write!(f, "torus-knot"),
        }
    }
}
