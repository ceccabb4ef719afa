use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the gridview pipeline.
#[derive(Debug, Error)]
pub enum GridViewError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Contour(#[from] ContourError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("renderer failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to mesh topology and entity lookup.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid topology: element {element} references node {node}, mesh has {node_count} nodes")]
    InvalidTopology {
        element: usize,
        node: i64,
        node_count: usize,
    },

    #[error("element not found: {0}")]
    ElementNotFound(usize),

    #[error("node not found: {0}")]
    NodeNotFound(i64),
}

/// Errors raised while parsing text or JSON input.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed edge record on line {line}: expected 3 integers, found {fields} fields")]
    MalformedEdgeRecord { line: usize, fields: usize },

    #[error("number format error on line {line}: {value:?}")]
    NumberFormat { line: usize, value: String },

    #[error("invalid mesh json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to scattered-data interpolation.
#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("invalid raster resolution {nx}x{ny}")]
    InvalidResolution { nx: usize, ny: usize },

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Errors related to iso-line extraction.
#[derive(Debug, Error)]
pub enum ContourError {
    #[error("invalid contour levels: {0}")]
    InvalidLevels(String),
}

/// Errors related to pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("invalid configuration json: {0}")]
    Json(#[source] serde_json::Error),
}

/// Convenience type alias for results using [`GridViewError`].
pub type Result<T> = std::result::Result<T, GridViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_topology_display() {
        let err: GridViewError = TopologyError::InvalidTopology {
            element: 3,
            node: 17,
            node_count: 4,
        }
        .into();
        let text = format!("{err}");
        assert!(text.contains("element 3"));
        assert!(text.contains("node 17"));
    }

    #[test]
    fn malformed_edge_display() {
        let err = ParseError::MalformedEdgeRecord { line: 2, fields: 4 };
        assert_eq!(
            format!("{err}"),
            "malformed edge record on line 2: expected 3 integers, found 4 fields"
        );
    }
}
