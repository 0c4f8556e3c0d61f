//! Scene graph types

use crate::texture::Texture;
use kiln_core::Rgb;
use std::sync::Arc;

/// A vertex with position, normal and UV coordinates
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Appearance of one renderable surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    pub base_color: Rgb,
    pub roughness: f32,
    pub metalness: f32,
    pub color_map: Option<Arc<Texture>>,
    /// Set whenever the material changed and must be re-uploaded
    pub needs_update: bool,
}

impl SurfaceMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: Rgb::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            color_map: None,
            needs_update: false,
        }
    }
}

/// Geometry plus material. Geometry is shared between copies of a scene,
/// materials are not.
#[derive(Debug, Clone)]
pub struct Surface {
    pub mesh: Arc<Mesh>,
    pub material: SurfaceMaterial,
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub surfaces: Vec<Surface>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surfaces.push(surface);
        self
    }

    fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    fn visit_surfaces_mut(&mut self, f: &mut dyn FnMut(&mut Surface)) {
        for surface in &mut self.surfaces {
            f(surface);
        }
        for child in &mut self.children {
            child.visit_surfaces_mut(f);
        }
    }
}

/// A loaded scene: a forest of nodes
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub roots: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(roots: Vec<SceneNode>) -> Self {
        Self { roots }
    }

    /// Depth-first over every node
    pub fn nodes(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.visit(&mut |n| out.push(n));
        }
        out
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> + '_ {
        self.nodes().into_iter().flat_map(|n| n.surfaces.iter())
    }

    pub fn for_each_surface_mut(&mut self, mut f: impl FnMut(&mut Surface)) {
        for root in &mut self.roots {
            root.visit_surfaces_mut(&mut f);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces().count()
    }

    pub fn triangle_count(&self) -> usize {
        self.surfaces().map(|s| s.mesh.triangle_count()).sum()
    }
}
