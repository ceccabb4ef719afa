//! File-backed loaders for meshes, edge lists and solution samples.
//!
//! Mesh files are JSON:
//!
//! ```text
//! {
//!     "Nodes": [ { "X": 0.0, "Y": 0.0 }, { "X": 1.0, "Y": 0.0 }, ... ],
//!     "Elements": [ { "NodeIds": [0, 1, 3, 4], "AreaId": 0 }, ... ]
//! }
//! ```
//!
//! Edge files hold `node1 node2 edgeId` per line; solution files hold
//! `x y value` per line.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{GridViewError, ParseError, Result};
use crate::field::{DecimalSeparator, SampleSet};
use crate::math::Point2;
use crate::mesh::{EdgeList, ElementSpec, Mesh};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MeshFile {
    nodes: Vec<NodeEntry>,
    elements: Vec<ElementEntry>,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ElementEntry {
    node_ids: [i64; 4],
    area_id: u32,
}

/// Parses a mesh from its JSON text.
///
/// # Errors
///
/// Returns a parse error for malformed JSON and a topology error if an
/// element references a missing node.
pub fn parse_mesh(text: &str) -> Result<Mesh> {
    let file: MeshFile = serde_json::from_str(text).map_err(ParseError::Json)?;
    let nodes = file.nodes.iter().map(|n| Point2::new(n.x, n.y)).collect();
    let elements: Vec<ElementSpec> = file
        .elements
        .iter()
        .map(|e| ElementSpec {
            node_ids: e.node_ids,
            area_id: e.area_id,
        })
        .collect();
    Ok(Mesh::build(nodes, &elements)?)
}

/// Loads a mesh JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mesh = parse_mesh(&read(path)?)?;
    info!(
        path = %path.display(),
        nodes = mesh.nodes().len(),
        elements = mesh.elements().len(),
        "Loaded mesh"
    );
    Ok(mesh)
}

/// Loads an edge list file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any line is malformed.
pub fn load_edges(path: impl AsRef<Path>) -> Result<EdgeList> {
    let path = path.as_ref();
    let edges = EdgeList::parse(&read(path)?)?;
    info!(path = %path.display(), edges = edges.len(), "Loaded edges");
    Ok(edges)
}

/// Loads a solution sample file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a well-shaped row holds
/// a non-numeric field.
pub fn load_samples(path: impl AsRef<Path>, separator: DecimalSeparator) -> Result<SampleSet> {
    let path = path.as_ref();
    let samples = SampleSet::parse(&read(path)?, separator)?;
    info!(path = %path.display(), samples = samples.len(), "Loaded samples");
    Ok(samples)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| GridViewError::Io {
        path: path.to_path_buf(),
        source,
    })
}
