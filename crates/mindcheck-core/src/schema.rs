//! Input schemas for each deployment, categorical code tables, and the Arrow
//! schema of the assessment export.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed label → integer code table for one categorical field.
#[derive(Debug)]
pub struct CategoryMap {
    entries: &'static [(&'static str, i64)],
}

impl CategoryMap {
    pub const fn new(entries: &'static [(&'static str, i64)]) -> Self {
        Self { entries }
    }

    /// Code for an exact label match.
    pub fn code(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, code)| code)
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|&(l, _)| l)
    }
}

pub const DEGREE: CategoryMap = CategoryMap::new(&[("Bachelors", 0), ("Masters", 1), ("PhD", 2)]);

pub const YES_NO: CategoryMap = CategoryMap::new(&[("No", 0), ("Yes", 1)]);

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Numeric,
    Categorical(&'static CategoryMap),
    /// Free text. Carried into the prompt, never into the feature vector.
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric,
        }
    }

    pub const fn categorical(name: &'static str, map: &'static CategoryMap) -> Self {
        Self {
            name,
            kind: FieldKind::Categorical(map),
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }
}

/// One per-track audio feature: read from `source`, divided by `divisor`,
/// defaulting to 0 when the track does not carry it.
#[derive(Debug, Clone, Copy)]
pub struct TrackField {
    pub name: &'static str,
    pub source: &'static str,
    pub divisor: f64,
}

impl TrackField {
    const fn same(name: &'static str) -> Self {
        Self {
            name,
            source: name,
            divisor: 1.0,
        }
    }
}

/// Shape of an inbound request.
#[derive(Debug, Clone, Copy)]
pub enum InputSchema {
    /// A flat object carrying every field, in this order.
    Record(&'static [FieldSpec]),
    /// A non-empty list of objects under `key`; fields are mean-pooled across entries.
    TrackList {
        key: &'static str,
        fields: &'static [TrackField],
    },
}

impl InputSchema {
    /// Ordered names of the fields in the normalized record.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self {
            Self::Record(fields) => fields.iter().map(|f| f.name).collect(),
            Self::TrackList { fields, .. } => fields.iter().map(|f| f.name).collect(),
        }
    }
}

pub const ACADEMIC_FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("Age"),
    FieldSpec::numeric("Academic Pressure"),
    FieldSpec::numeric("CGPA"),
    FieldSpec::numeric("Study Satisfaction"),
    FieldSpec::numeric("Dietary Habits"),
    FieldSpec::categorical("Degree", &DEGREE),
    FieldSpec::categorical("Have you ever had suicidal thoughts ?", &YES_NO),
    FieldSpec::numeric("Work/Study Hours"),
    FieldSpec::numeric("Fatigue Index"),
    FieldSpec::numeric("Stress Risk Score"),
];

pub const ESSAY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("Q1"),
    FieldSpec::text("Q2"),
    FieldSpec::text("Q3"),
];

pub const TRACK_FIELDS: &[TrackField] = &[
    TrackField::same("danceability"),
    TrackField::same("energy"),
    TrackField::same("loudness"),
    TrackField::same("speechiness"),
    TrackField::same("acousticness"),
    TrackField::same("instrumentalness"),
    TrackField::same("liveness"),
    TrackField::same("valence"),
    TrackField::same("tempo"),
    TrackField {
        name: "spec_rate",
        source: "spectral_rolloff",
        divisor: 1e7,
    },
];

/// The assessment variants served by one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentKind {
    Academic,
    Essay,
    Music,
}

impl DeploymentKind {
    pub const ALL: [DeploymentKind; 3] = [Self::Academic, Self::Essay, Self::Music];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Essay => "essay",
            Self::Music => "music",
        }
    }

    pub fn schema(&self) -> InputSchema {
        match self {
            Self::Academic => InputSchema::Record(ACADEMIC_FIELDS),
            Self::Essay => InputSchema::Record(ESSAY_FIELDS),
            Self::Music => InputSchema::TrackList {
                key: "tracks",
                fields: TRACK_FIELDS,
            },
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown deployment '{s}' (expected academic, essay or music)"))
    }
}

/// Arrow schema definitions for exported assessments.
pub mod export {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

    /// One row per assessed request.
    pub fn assessment_schema() -> Schema {
        Schema::new(vec![
            Field::new("identifier", DataType::Utf8, true),
            Field::new("deployment", DataType::Utf8, false),
            Field::new("label", DataType::Utf8, false),
            Field::new("model_probability", DataType::Float64, false),
            Field::new("reported_probability", DataType::Float64, false),
            Field::new("probability_source", DataType::Utf8, false),
            Field::new("narrative_degraded", DataType::Boolean, false),
            Field::new("narrative_text", DataType::Utf8, false),
            Field::new(
                "assessed_at",
                DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
                false,
            ),
        ])
    }
}
