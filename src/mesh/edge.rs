use std::collections::HashMap;

use tracing::debug;

use super::Mesh;
use crate::error::{ParseError, TopologyError};
use crate::math::polygon_2d::midpoint;
use crate::math::Point2;

/// An externally labelled edge between two mesh nodes.
///
/// The edge id is not derived from the node pair and is not checked against
/// element adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    /// First node id.
    pub node_a: i64,
    /// Second node id.
    pub node_b: i64,
    /// External edge label.
    pub edge_id: i64,
}

impl EdgeRecord {
    /// Label anchor of the edge: the mean of its two node positions.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NodeNotFound` if either node is not in `mesh`.
    pub fn midpoint(&self, mesh: &Mesh) -> Result<Point2, TopologyError> {
        let a = mesh.node(self.node_a)?;
        let b = mesh.node(self.node_b)?;
        Ok(midpoint(a, b))
    }
}

/// Ordered edge records with a node-pair lookup.
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    records: Vec<EdgeRecord>,
    by_pair: HashMap<(i64, i64), i64>,
}

impl EdgeList {
    /// Builds an edge list from records, preserving their order.
    #[must_use]
    pub fn new(records: Vec<EdgeRecord>) -> Self {
        let mut by_pair = HashMap::with_capacity(records.len());
        for r in &records {
            by_pair.entry(pair_key(r.node_a, r.node_b)).or_insert(r.edge_id);
        }
        Self { records, by_pair }
    }

    /// Parses `node1 node2 edgeId` records, one per line.
    ///
    /// A trailing newline ends the last record; a blank line anywhere else is
    /// a malformed record.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MalformedEdgeRecord` if a line does not hold
    /// exactly three fields, or `ParseError::NumberFormat` if a field is not
    /// an integer.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut records = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[a, b, id] = fields.as_slice() else {
                return Err(ParseError::MalformedEdgeRecord {
                    line: line_no,
                    fields: fields.len(),
                });
            };
            records.push(EdgeRecord {
                node_a: parse_int(a, line_no)?,
                node_b: parse_int(b, line_no)?,
                edge_id: parse_int(id, line_no)?,
            });
        }
        debug!(edges = records.len(), "Parsed edge list");
        Ok(Self::new(records))
    }

    /// Records in input order.
    #[must_use]
    pub fn records(&self) -> &[EdgeRecord] {
        &self.records
    }

    /// Iterates over records in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, EdgeRecord> {
        self.records.iter()
    }

    /// Number of records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the list holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up the label of the edge joining `a` and `b`, in either direction.
    ///
    /// If the pair is listed more than once, the first record wins.
    #[must_use]
    pub fn edge_id(&self, a: i64, b: i64) -> Option<i64> {
        self.by_pair.get(&pair_key(a, b)).copied()
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a EdgeRecord;
    type IntoIter = std::slice::Iter<'a, EdgeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn pair_key(a: i64, b: i64) -> (i64, i64) {
    (a.min(b), a.max(b))
}

fn parse_int(field: &str, line: usize) -> Result<i64, ParseError> {
    field.parse().map_err(|_| ParseError::NumberFormat {
        line,
        value: field.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::mesh::ElementSpec;

    fn mesh() -> Mesh {
        Mesh::build(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
                Point2::new(0.0, 2.0),
                Point2::new(3.0, 2.0),
            ],
            &[ElementSpec {
                node_ids: [0, 1, 2, 3],
                area_id: 1,
            }],
        )
        .unwrap()
    }

    #[test]
    fn parse_preserves_order() {
        let edges = EdgeList::parse("0 1 5\n1 3 2\n3 2 9\n2 0 0\n").unwrap();
        assert_eq!(edges.len(), 4);
        let ids: Vec<i64> = edges.iter().map(|e| e.edge_id).collect();
        assert_eq!(ids, vec![5, 2, 9, 0]);
    }

    #[test]
    fn parse_accepts_mixed_whitespace() {
        let edges = EdgeList::parse("0\t1   5\r\n  1 3 2  \n").unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges.records()[1].node_b, 3);
    }

    #[test]
    fn blank_line_is_malformed() {
        let err = EdgeList::parse("0 1 5\n\n1 2 6\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedEdgeRecord { line: 2, fields: 0 }
        ));
        assert!(EdgeList::parse("0 1 5\n   \n").is_err());
        assert_eq!(EdgeList::parse("0 1 5\n").unwrap().len(), 1);
        assert!(EdgeList::parse("").unwrap().is_empty());
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = EdgeList::parse("0 1 5\n1 3\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedEdgeRecord { line: 2, fields: 2 }
        ));
        assert!(EdgeList::parse("0 1 5 7\n").is_err());
    }

    #[test]
    fn non_integer_field_is_number_format() {
        let err = EdgeList::parse("0 1 5\n1 x 2\n").unwrap_err();
        match err {
            ParseError::NumberFormat { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(EdgeList::parse("0 1 2.5\n").is_err());
    }

    #[test]
    fn midpoint_is_exact_mean() {
        let mesh = mesh();
        let edge = EdgeRecord {
            node_a: 1,
            node_b: 2,
            edge_id: 42,
        };
        let m = edge.midpoint(&mesh).unwrap();
        assert_relative_eq!(m.x, 1.5);
        assert_relative_eq!(m.y, 1.0);
    }

    #[test]
    fn midpoint_with_unknown_node_fails() {
        let edge = EdgeRecord {
            node_a: 0,
            node_b: 9,
            edge_id: 1,
        };
        assert!(matches!(
            edge.midpoint(&mesh()),
            Err(TopologyError::NodeNotFound(9))
        ));
    }

    #[test]
    fn pair_lookup_is_direction_independent() {
        let edges = EdgeList::parse("0 1 5\n1 0 6\n3 2 9\n").unwrap();
        assert_eq!(edges.edge_id(1, 0), Some(5));
        assert_eq!(edges.edge_id(2, 3), Some(9));
        assert_eq!(edges.edge_id(0, 3), None);
    }
}
