mod contour;
mod interpolate;

pub use contour::{Contour, ContourLevels, ContourSet, ExtractContours};
pub use interpolate::{Interpolate, InterpolationMethod, InterpolationParams, Resolution};
