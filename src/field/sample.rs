use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::math::{Bounds2, Point2};

/// Decimal separator used by a solution file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalSeparator {
    #[default]
    #[serde(rename = ".")]
    Dot,
    #[serde(rename = ",")]
    Comma,
}

impl DecimalSeparator {
    /// Parses a single numeric field written with this separator.
    ///
    /// Returns `None` if the field is not a number.
    #[must_use]
    pub fn parse_f64(self, field: &str) -> Option<f64> {
        match self {
            Self::Dot => field.parse().ok(),
            Self::Comma => field.replace(',', ".").parse().ok(),
        }
    }
}

/// One scattered scalar sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl Sample {
    /// Creates a sample at `(x, y)` carrying `value`.
    #[must_use]
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Sample location as a point.
    #[must_use]
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Returns `true` if coordinates and value are all finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.value.is_finite()
    }
}

/// An unordered collection of scalar samples with no implied topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    /// Wraps samples as given; no filtering or deduplication.
    #[must_use]
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Parses `x y value` rows separated by single spaces.
    ///
    /// Rows that do not split into exactly three fields are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::NumberFormat` if a three-field row contains a
    /// field that is not a number under `separator`.
    pub fn parse(text: &str, separator: DecimalSeparator) -> Result<Self, ParseError> {
        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let row = line.strip_suffix('\r').unwrap_or(line);
            let fields: Vec<&str> = row.split(' ').collect();
            let &[x, y, value] = fields.as_slice() else {
                skipped += 1;
                continue;
            };
            let parse = |field: &str| {
                separator
                    .parse_f64(field)
                    .ok_or_else(|| ParseError::NumberFormat {
                        line: idx + 1,
                        value: field.to_owned(),
                    })
            };
            samples.push(Sample::new(parse(x)?, parse(y)?, parse(value)?));
        }

        debug!(samples = samples.len(), skipped, "Parsed sample rows");
        Ok(Self { samples })
    }

    /// Samples in input order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over samples in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Number of samples, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bounding rectangle of the sample coordinates.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.samples.iter().map(Sample::position))
    }

    /// `(min, max)` of the sample values.
    #[must_use]
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().map(|s| s.value);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Samples with coincident coordinates collapsed, keeping the first
    /// occurrence in input order.
    #[must_use]
    pub fn deduplicated(&self) -> Vec<Sample> {
        let mut seen = HashSet::with_capacity(self.samples.len());
        self.samples
            .iter()
            .filter(|s| seen.insert(coordinate_key(s)))
            .copied()
            .collect()
    }
}

impl FromIterator<Sample> for SampleSet {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Bit-exact coordinate key; `-0.0` and `0.0` compare equal.
fn coordinate_key(s: &Sample) -> (u64, u64) {
    ((s.x + 0.0).to_bits(), (s.y + 0.0).to_bits())
}
