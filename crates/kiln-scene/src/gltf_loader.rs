//! glTF/GLB scene loading

use crate::graph::{Mesh, SceneGraph, SceneNode, Surface, SurfaceMaterial, Vertex};
use kiln_core::{KilnError, Result, Rgb};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Primitives of one glTF mesh, shared by every node that instances it
type MeshPrimitives = Vec<(Arc<Mesh>, SurfaceMaterial)>;

/// Import a glTF or GLB file as a scene graph
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<SceneGraph> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| {
        KilnError::ImportError(format!("Failed to import glTF {}: {}", path.display(), e))
    })?;

    let mut meshes: HashMap<usize, MeshPrimitives> = HashMap::new();
    for mesh in document.meshes() {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, &position)| Vertex {
                    position,
                    normal: normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                    uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                })
                .collect();

            primitives.push((
                Arc::new(Mesh { vertices, indices }),
                material_of(&primitive.material()),
            ));
        }
        meshes.insert(mesh.index(), primitives);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| KilnError::ImportError(format!("{} contains no scene", path.display())))?;

    let roots = scene.nodes().map(|n| convert_node(&n, &meshes)).collect();
    Ok(SceneGraph::new(roots))
}

fn convert_node(node: &gltf::Node, meshes: &HashMap<usize, MeshPrimitives>) -> SceneNode {
    let name = node
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let surfaces: Vec<Surface> = node
        .mesh()
        .and_then(|m| meshes.get(&m.index()))
        .map(|prims| {
            prims
                .iter()
                .map(|(mesh, material)| Surface {
                    mesh: Arc::clone(mesh),
                    material: material.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    SceneNode {
        name,
        surfaces,
        children: node.children().map(|c| convert_node(&c, meshes)).collect(),
    }
}

fn material_of(material: &gltf::Material) -> SurfaceMaterial {
    let name = material
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0)));

    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();

    SurfaceMaterial {
        base_color: Rgb::new(r, g, b),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        ..SurfaceMaterial::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_minimal_glb;

    #[test]
    fn test_load_minimal_glb() {
        let dir = std::env::temp_dir().join(format!("kiln_gltf_test_{}", uuid::Uuid::new_v4()));
        let path = write_minimal_glb(&dir, "tri.glb").unwrap();

        let scene = load_gltf(&path).unwrap();
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.surface_count(), 1);
        assert_eq!(scene.triangle_count(), 1);

        let surface = scene.surfaces().next().unwrap();
        assert_eq!(surface.mesh.vertex_count(), 3);
        assert_eq!(surface.material.metalness, 1.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = load_gltf("/nonexistent/kiln/model.glb").unwrap_err();
        assert!(matches!(err, KilnError::ImportError(_)));
    }
}
