pub mod raster;
pub mod sample;

pub use raster::Raster;
pub use sample::{DecimalSeparator, Sample, SampleSet};
