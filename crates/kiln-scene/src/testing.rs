//! Fixtures for tests in this and downstream crates

use crate::graph::SceneGraph;
use crate::loader::{MockShape, SceneLoader};
use kiln_core::{KilnError, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Smallest valid GLB: one node, one mesh, one triangle, no material
pub fn minimal_glb() -> Vec<u8> {
    let json = serde_json::json!({
        "asset": { "version": "2.0", "generator": "kiln-test" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "triangle" }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "max": [1.0, 1.0, 0.0],
                "min": [-1.0, 0.0, 0.0]
            },
            {
                "bufferView": 1,
                "componentType": 5123,
                "count": 3,
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "buffers": [{ "byteLength": 44 }]
    });

    let mut json_bytes = json.to_string().into_bytes();
    json_bytes.resize((json_bytes.len() + 3) & !3, b' ');

    let mut bin = Vec::with_capacity(44);
    for p in [[-1.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.resize(44, 0);

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_bytes);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}

/// Write `minimal_glb()` to `dir/name`, creating `dir`
pub fn write_minimal_glb(dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, minimal_glb())?;
    Ok(path)
}

/// Loader that counts calls and returns a torus knot for any reference.
/// References containing `missing` fail.
#[derive(Debug, Clone, Default)]
pub struct CountingLoader {
    loads: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every load, to widen race windows
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            loads: Arc::default(),
            delay,
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl SceneLoader for CountingLoader {
    fn load(&self, reference: &str) -> Result<SceneGraph> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if reference.contains("missing") {
            return Err(KilnError::ImportError(format!("{} not found", reference)));
        }
        Ok(MockShape::TorusKnot.scene())
    }
}
