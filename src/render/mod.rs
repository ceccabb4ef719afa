use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::field::Raster;
use crate::math::Point2;
use crate::mesh::{EdgeList, Mesh};
use crate::operations::ContourSet;

/// Draws a prepared [`Scene`].
///
/// Implementations own every styling decision (palette, line styles,
/// fonts); the scene only carries geometry, palette indices and labels.
pub trait Renderer {
    type Error;

    /// Renders one scene.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn render(&mut self, scene: &Scene) -> std::result::Result<(), Self::Error>;
}

/// Which layers a scene contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Element polygons filled by region.
    #[default]
    Regions,
    /// Filled polygons plus node, edge and element id labels.
    Annotated,
    /// Element outlines over the interpolated field and its iso-lines.
    Solution,
}

/// An element boundary ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPolygon {
    /// Element id (position in the mesh element sequence).
    pub element: usize,
    /// Corners in boundary traversal order.
    pub boundary: [Point2; 4],
    /// Palette slot for the fill; `None` draws the outline only.
    pub color_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Node,
    Edge,
    Element,
}

/// An identifier to print at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub kind: LabelKind,
    pub id: i64,
    pub position: Point2,
}

/// Interpolated field drawn as a filled color map with dashed iso-lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayer {
    pub raster: Raster,
    /// Number of color bands for the filled map.
    pub fill_levels: usize,
    pub contours: ContourSet,
}

/// Everything a renderer needs for one picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub view: View,
    pub elements: Vec<ElementPolygon>,
    pub labels: Vec<Label>,
    pub field: Option<FieldLayer>,
}

impl Scene {
    /// Labels of one kind, in emission order.
    pub fn labels_of(&self, kind: LabelKind) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(move |l| l.kind == kind)
    }
}

/// Parameters controlling scene assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneParams {
    pub view: View,
    /// Number of palette entries; region tags wrap modulo this.
    pub palette_size: usize,
    /// Number of color bands for the field layer.
    pub fill_levels: usize,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            view: View::Regions,
            palette_size: 10,
            fill_levels: 100,
        }
    }
}

/// Assembles a [`Scene`] from the mesh and the optional edge and field data.
pub struct BuildScene {
    params: SceneParams,
}

impl BuildScene {
    /// Creates a new `BuildScene` operation.
    #[must_use]
    pub fn new(params: SceneParams) -> Self {
        Self { params }
    }

    /// Executes the assembly.
    ///
    /// Edges are only labelled in the annotated view; the field layer is only
    /// attached in the solution view.
    ///
    /// # Errors
    ///
    /// Returns an error if the palette is empty, if the solution view has no
    /// field to show, or if an edge references a node outside the mesh.
    pub fn execute(
        &self,
        mesh: &Mesh,
        edges: Option<&EdgeList>,
        field: Option<(Raster, ContourSet)>,
    ) -> Result<Scene> {
        let SceneParams {
            view,
            palette_size,
            fill_levels,
        } = self.params;
        if palette_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "palette_size",
                reason: "must be at least 1".into(),
            }
            .into());
        }

        let mut elements = Vec::with_capacity(mesh.elements().len());
        for (id, element) in mesh.elements().iter().enumerate() {
            let color_index = match view {
                View::Solution => None,
                View::Regions | View::Annotated => Some(element.area_id() as usize % palette_size),
            };
            elements.push(ElementPolygon {
                element: id,
                boundary: mesh.geometric_boundary(id)?,
                color_index,
            });
        }

        let labels = if view == View::Annotated {
            annotate(mesh, edges)?
        } else {
            Vec::new()
        };

        let field = match (view, field) {
            (View::Solution, Some((raster, contours))) => {
                if fill_levels == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "fill_levels",
                        reason: "must be at least 1".into(),
                    }
                    .into());
                }
                Some(FieldLayer {
                    raster,
                    fill_levels,
                    contours,
                })
            }
            (View::Solution, None) => {
                return Err(ConfigError::InvalidValue {
                    key: "view",
                    reason: "the solution view needs a scalar field".into(),
                }
                .into());
            }
            _ => None,
        };

        info!(
            ?view,
            elements = elements.len(),
            labels = labels.len(),
            field = field.is_some(),
            "Built scene"
        );

        Ok(Scene {
            view,
            elements,
            labels,
            field,
        })
    }
}

/// Element ids at centroids, then edge ids at midpoints, then node ids.
#[allow(clippy::cast_possible_wrap)]
fn annotate(mesh: &Mesh, edges: Option<&EdgeList>) -> Result<Vec<Label>> {
    let mut labels = Vec::new();
    for id in 0..mesh.elements().len() {
        labels.push(Label {
            kind: LabelKind::Element,
            id: id as i64,
            position: mesh.centroid(id)?,
        });
    }
    for edge in edges.into_iter().flatten() {
        labels.push(Label {
            kind: LabelKind::Edge,
            id: edge.edge_id,
            position: edge.midpoint(mesh)?,
        });
    }
    for (id, node) in mesh.nodes().iter().enumerate() {
        labels.push(Label {
            kind: LabelKind::Node,
            id: id as i64,
            position: *node,
        });
    }
    Ok(labels)
}
