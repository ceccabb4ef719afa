pub mod edge;

pub use edge::{EdgeList, EdgeRecord};

use tracing::debug;

use crate::error::TopologyError;
use crate::math::polygon_2d::{area_centroid, vertex_average};
use crate::math::{Bounds2, Point2};

/// Storage positions visited, in order, when walking an element boundary.
///
/// Elements store their corners as (bottom-left, bottom-right, top-left,
/// top-right); the boundary is bottom-left, bottom-right, top-right, top-left.
pub const GEOMETRIC_ORDER_FROM_STORAGE: [usize; 4] = [0, 1, 3, 2];

/// Raw element description, as read from a mesh file.
///
/// Node ids are signed so that out-of-range input can be reported rather
/// than rejected by the type system at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    /// Node indices in storage order.
    pub node_ids: [i64; 4],
    /// Region tag.
    pub area_id: u32,
}

/// A quadrilateral element whose node ids are known to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    node_ids: [usize; 4],
    area_id: u32,
}

impl Element {
    /// Node indices in storage order.
    #[must_use]
    pub fn node_ids(&self) -> [usize; 4] {
        self.node_ids
    }

    /// Region tag, used only for display color selection.
    #[must_use]
    pub fn area_id(&self) -> u32 {
        self.area_id
    }

    /// Node indices in geometric boundary order.
    #[must_use]
    pub fn geometric_node_ids(&self) -> [usize; 4] {
        GEOMETRIC_ORDER_FROM_STORAGE.map(|pos| self.node_ids[pos])
    }
}

/// A read-only 2D quadrilateral mesh.
///
/// Nodes are identified by their position in the node sequence; elements
/// reference nodes by index only.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    nodes: Vec<Point2>,
    elements: Vec<Element>,
}

impl Mesh {
    /// Builds a mesh, validating every element's node references.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if any element references a
    /// node index outside `[0, nodes.len())`.
    pub fn build(nodes: Vec<Point2>, elements: &[ElementSpec]) -> Result<Self, TopologyError> {
        let node_count = nodes.len();
        let mut checked = Vec::with_capacity(elements.len());

        for (element, spec) in elements.iter().enumerate() {
            let mut node_ids = [0usize; 4];
            for (slot, &node) in node_ids.iter_mut().zip(&spec.node_ids) {
                *slot = usize::try_from(node)
                    .ok()
                    .filter(|&idx| idx < node_count)
                    .ok_or(TopologyError::InvalidTopology {
                        element,
                        node,
                        node_count,
                    })?;
            }
            checked.push(Element {
                node_ids,
                area_id: spec.area_id,
            });
        }

        debug!(nodes = node_count, elements = checked.len(), "Built mesh");

        Ok(Self {
            nodes,
            elements: checked,
        })
    }

    /// All node positions, indexed by node id.
    #[must_use]
    pub fn nodes(&self) -> &[Point2] {
        &self.nodes
    }

    /// All elements, indexed by element id.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Returns the position of a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node id is negative or out of range.
    pub fn node(&self, id: i64) -> Result<&Point2, TopologyError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.nodes.get(idx))
            .ok_or(TopologyError::NodeNotFound(id))
    }

    /// Returns an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element id is out of range.
    pub fn element(&self, id: usize) -> Result<&Element, TopologyError> {
        self.elements
            .get(id)
            .ok_or(TopologyError::ElementNotFound(id))
    }

    /// The four corners of an element in boundary traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the element id is out of range.
    pub fn geometric_boundary(&self, id: usize) -> Result<[Point2; 4], TopologyError> {
        let element = self.element(id)?;
        Ok(element.geometric_node_ids().map(|node| self.nodes[node]))
    }

    /// Node ids providing the points of [`Mesh::geometric_boundary`].
    ///
    /// # Errors
    ///
    /// Returns an error if the element id is out of range.
    pub fn geometric_node_ids(&self, id: usize) -> Result<[usize; 4], TopologyError> {
        Ok(self.element(id)?.geometric_node_ids())
    }

    /// Label anchor of an element: the mean of its four corners.
    ///
    /// This is not the area centroid; the two agree only for parallelograms.
    /// See [`Mesh::area_centroid`] for the exact value.
    ///
    /// # Errors
    ///
    /// Returns an error if the element id is out of range.
    pub fn centroid(&self, id: usize) -> Result<Point2, TopologyError> {
        let corners = self.geometric_boundary(id)?;
        vertex_average(&corners).ok_or(TopologyError::ElementNotFound(id))
    }

    /// Area-weighted centroid of an element, `None` if it has zero area.
    ///
    /// # Errors
    ///
    /// Returns an error if the element id is out of range.
    pub fn area_centroid(&self, id: usize) -> Result<Option<Point2>, TopologyError> {
        let corners = self.geometric_boundary(id)?;
        Ok(area_centroid(&corners))
    }

    /// Bounding rectangle of all nodes.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.nodes.iter().copied())
    }
}
