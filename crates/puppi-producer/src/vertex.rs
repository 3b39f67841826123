//! Reconstructed vertices and the effective pileup-vertex count.

use serde::{Deserialize, Serialize};

/// Reconstructed vertex summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Longitudinal position.
    pub z: f64,
    /// Degrees of freedom of the vertex fit.
    pub ndof: f64,
    /// Placeholder vertex inserted when no real vertex was found.
    #[serde(default)]
    pub is_fake: bool,
}

/// Quality cuts a vertex must pass to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexCut {
    /// Minimum degrees of freedom.
    #[serde(default = "default_ndof_cut")]
    pub ndof_cut: f64,
    /// Maximum `|z|`.
    #[serde(default = "default_z_cut")]
    pub z_cut: f64,
}

fn default_ndof_cut() -> f64 {
    4.0
}

fn default_z_cut() -> f64 {
    24.0
}

impl Default for VertexCut {
    fn default() -> Self {
        Self {
            ndof_cut: default_ndof_cut(),
            z_cut: default_z_cut(),
        }
    }
}

impl VertexCut {
    /// Whether `vertex` is a real, well-fitted vertex inside the luminous region.
    pub fn accepts(&self, vertex: &Vertex) -> bool {
        !vertex.is_fake && vertex.ndof >= self.ndof_cut && vertex.z.abs() <= self.z_cut
    }
}

/// Number of vertices passing `cut`.
pub fn count_pileup_vertices(cut: &VertexCut, vertices: &[Vertex]) -> usize {
    vertices.iter().filter(|vertex| cut.accepts(vertex)).count()
}
