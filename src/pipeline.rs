use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, GridViewError, Result};
use crate::field::{DecimalSeparator, SampleSet};
use crate::io;
use crate::mesh::{EdgeList, Mesh};
use crate::operations::{ContourLevels, ExtractContours, Interpolate, InterpolationParams};
use crate::render::{BuildScene, Renderer, Scene, SceneParams, View};

fn default_fill_levels() -> usize {
    100
}

fn default_palette_size() -> usize {
    10
}

/// Inputs and settings of one visualization run.
///
/// Deserialized from JSON; every field except `mesh_path` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Mesh JSON file.
    pub mesh_path: PathBuf,
    /// Optional edge list file.
    #[serde(default)]
    pub edges_path: Option<PathBuf>,
    /// Optional solution sample file.
    #[serde(default)]
    pub solution_path: Option<PathBuf>,
    /// Decimal separator of the solution file.
    #[serde(default)]
    pub decimal_separator: DecimalSeparator,
    #[serde(default)]
    pub interpolation: InterpolationParams,
    /// Iso-line levels: a count or an explicit ascending list.
    #[serde(default)]
    pub contour_levels: ContourLevels,
    /// Color bands of the filled field map.
    #[serde(default = "default_fill_levels")]
    pub fill_levels: usize,
    /// Palette entries available for region colors.
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
    #[serde(default)]
    pub view: View,
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the mesh.
    #[must_use]
    pub fn new(mesh_path: impl Into<PathBuf>) -> Self {
        Self {
            mesh_path: mesh_path.into(),
            edges_path: None,
            solution_path: None,
            decimal_separator: DecimalSeparator::default(),
            interpolation: InterpolationParams::default(),
            contour_levels: ContourLevels::default(),
            fill_levels: default_fill_levels(),
            palette_size: default_palette_size(),
            view: View::default(),
        }
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the text is not a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text).map_err(ConfigError::Json)?)
    }

    /// Reads a configuration file. Relative input paths are resolved
    /// against the directory holding the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GridViewError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Checks values that deserialization cannot rule out.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &'static str, reason: &str| -> Result<()> {
            Err(ConfigError::InvalidValue {
                key,
                reason: reason.to_owned(),
            }
            .into())
        };
        if self.palette_size == 0 {
            return invalid("palette_size", "must be at least 1");
        }
        if self.fill_levels == 0 {
            return invalid("fill_levels", "must be at least 1");
        }
        let res = self.interpolation.resolution;
        if res.nx == 0 || res.ny == 0 {
            return invalid("interpolation.resolution", "both axes must be at least 1");
        }
        if let ContourLevels::Count(n) = self.contour_levels {
            if n > ContourLevels::MAX_COUNT {
                return invalid("contour_levels", "level count is too large");
            }
        }
        if self.view == View::Solution && self.solution_path.is_none() {
            return invalid("solution_path", "required by the solution view");
        }
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.mesh_path);
        self.edges_path.iter_mut().for_each(join);
        self.solution_path.iter_mut().for_each(join);
    }

    fn scene_params(&self) -> SceneParams {
        SceneParams {
            view: self.view,
            palette_size: self.palette_size,
            fill_levels: self.fill_levels,
        }
    }
}

/// Load, interpolate, contour and assemble a scene, stage by stage.
///
/// Each stage consumes the previous stage's output; nothing is shared
/// between runs.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Loads the configured files and assembles the scene.
    ///
    /// # Errors
    ///
    /// Returns the first load, interpolation, contouring or assembly error.
    pub fn build_scene(&self) -> Result<Scene> {
        let config = &self.config;
        let mesh = io::load_mesh(&config.mesh_path)?;
        let edges = config
            .edges_path
            .as_ref()
            .map(io::load_edges)
            .transpose()?;
        let samples = config
            .solution_path
            .as_ref()
            .map(|p| io::load_samples(p, config.decimal_separator))
            .transpose()?;
        self.assemble(&mesh, edges.as_ref(), samples.as_ref())
    }

    /// Assembles a scene from already loaded inputs.
    ///
    /// The field is interpolated and contoured only for the solution view.
    ///
    /// # Errors
    ///
    /// Returns the first interpolation, contouring or assembly error.
    pub fn assemble(
        &self,
        mesh: &Mesh,
        edges: Option<&EdgeList>,
        samples: Option<&SampleSet>,
    ) -> Result<Scene> {
        let config = &self.config;
        let field = match (config.view, samples) {
            (View::Solution, Some(samples)) => {
                let raster = Interpolate::new(config.interpolation).execute(samples)?;
                let contours =
                    ExtractContours::new(config.contour_levels.clone()).execute(&raster)?;
                Some((raster, contours))
            }
            (_, Some(_)) => {
                debug!(view = ?config.view, "View does not show the field, skipping interpolation");
                None
            }
            (_, None) => None,
        };
        BuildScene::new(config.scene_params()).execute(mesh, edges, field)
    }

    /// Builds the scene and hands it to `renderer`.
    ///
    /// # Errors
    ///
    /// Returns a pipeline error, or `GridViewError::Render` wrapping the
    /// renderer's own error.
    pub fn run<R>(&self, renderer: &mut R) -> Result<Scene>
    where
        R: Renderer,
        R::Error: std::error::Error + Send + Sync + 'static,
    {
        let scene = self.build_scene()?;
        renderer
            .render(&scene)
            .map_err(|e| GridViewError::Render(Box::new(e)))?;
        info!(view = ?scene.view, "Rendered scene");
        Ok(scene)
    }
}
