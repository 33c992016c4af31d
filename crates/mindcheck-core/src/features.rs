//! Feature normalization: loosely-typed JSON request → strictly-typed record.
//!
//! Required fields are checked first and the first absent one fails the
//! request. Only then is every field coerced; any field that does not
//! coerce rejects the whole record with one aggregate error listing the
//! offending fields.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AssessError;
use crate::schema::{FieldKind, FieldSpec, InputSchema, TrackField};

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category { label: String, code: i64 },
    Text(String),
}

impl FeatureValue {
    /// Numeric encoding for the classifier. Text has none.
    pub fn as_feature(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category { code, .. } => Some(*code as f64),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Category { label, .. } => f.write_str(label),
            Self::Text(t) => f.write_str(t),
        }
    }
}

/// Ordered, validated request fields. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    fields: Vec<(&'static str, FeatureValue)>,
}

impl FeatureRecord {
    pub fn fields(&self) -> &[(&'static str, FeatureValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// The feature vector in schema order, text fields skipped.
    pub fn vector(&self) -> Vec<f64> {
        self.fields
            .iter()
            .filter_map(|(_, v)| v.as_feature())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalize a raw request against a deployment's input schema.
pub fn normalize(schema: &InputSchema, raw: &Value) -> Result<FeatureRecord, AssessError> {
    let obj = raw.as_object().ok_or(AssessError::NotAnObject)?;
    let record = match schema {
        InputSchema::Record(fields) => normalize_record(fields, obj)?,
        InputSchema::TrackList { key, fields } => normalize_tracks(key, fields, obj)?,
    };
    debug!(fields = record.len(), "normalized feature record");
    Ok(record)
}

fn normalize_record(
    fields: &[FieldSpec],
    obj: &Map<String, Value>,
) -> Result<FeatureRecord, AssessError> {
    if let Some(missing) = fields.iter().find(|f| !obj.contains_key(f.name)) {
        return Err(AssessError::MissingField(missing.name.to_string()));
    }

    let mut values = Vec::with_capacity(fields.len());
    let mut invalid = Vec::new();
    for spec in fields {
        match coerce_field(spec, &obj[spec.name]) {
            Some(v) => values.push((spec.name, v)),
            None => invalid.push(spec.name.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(AssessError::InvalidInput { fields: invalid });
    }
    Ok(FeatureRecord { fields: values })
}

fn coerce_field(spec: &FieldSpec, value: &Value) -> Option<FeatureValue> {
    match spec.kind {
        FieldKind::Numeric => coerce_number(value).map(FeatureValue::Number),
        FieldKind::Categorical(map) => {
            let label = value.as_str()?;
            let Some(code) = map.code(label) else {
                debug!(
                    field = spec.name,
                    label,
                    accepted = %map.labels().collect::<Vec<_>>().join(", "),
                    "unknown category label"
                );
                return None;
            };
            Some(FeatureValue::Category {
                label: label.to_string(),
                code,
            })
        }
        FieldKind::Text => match value {
            Value::String(s) if !s.trim().is_empty() => Some(FeatureValue::Text(s.clone())),
            _ => None,
        },
    }
}

/// Numbers as-is, numeric strings parsed, booleans as 1/0. Must be finite.
fn coerce_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn normalize_tracks(
    key: &str,
    fields: &[TrackField],
    obj: &Map<String, Value>,
) -> Result<FeatureRecord, AssessError> {
    let tracks = match obj.get(key) {
        None | Some(Value::Null) => return Err(AssessError::MissingField(key.to_string())),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(AssessError::InvalidInput {
                fields: vec![key.to_string()],
            });
        }
    };

    // Null entries are tracks the upstream service had no features for.
    let tracks: Vec<&Value> = tracks.iter().filter(|t| !t.is_null()).collect();
    if tracks.is_empty() {
        return Err(AssessError::MissingField(key.to_string()));
    }

    let mut sums = vec![0.0f64; fields.len()];
    let mut invalid: Vec<String> = Vec::new();
    let mut flag = |name: &str| {
        if !invalid.iter().any(|n| n == name) {
            invalid.push(name.to_string());
        }
    };

    for track in &tracks {
        let Some(track) = track.as_object() else {
            flag(key);
            continue;
        };
        for (sum, field) in sums.iter_mut().zip(fields) {
            match track.get(field.source) {
                None | Some(Value::Null) => {}
                Some(v) => match coerce_number(v) {
                    Some(x) => *sum += x / field.divisor,
                    None => flag(field.name),
                },
            }
        }
    }

    // Finite inputs can still overflow when summed.
    let n = tracks.len() as f64;
    let means: Vec<f64> = sums.iter().map(|sum| sum / n).collect();
    for (field, mean) in fields.iter().zip(&means) {
        if !mean.is_finite() {
            flag(field.name);
        }
    }

    if !invalid.is_empty() {
        return Err(AssessError::InvalidInput { fields: invalid });
    }

    let values = fields
        .iter()
        .zip(means)
        .map(|(field, mean)| (field.name, FeatureValue::Number(mean)))
        .collect();
    debug!(tracks = tracks.len(), "mean-pooled track features");
    Ok(FeatureRecord { fields: values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DeploymentKind;
    use serde_json::json;

    fn academic_request() -> Value {
        json!({
            "user_id": "user_1",
            "Age": 21,
            "Academic Pressure": "4",
            "CGPA": 7.5,
            "Study Satisfaction": 2,
            "Dietary Habits": 1,
            "Degree": "Masters",
            "Have you ever had suicidal thoughts ?": "No",
            "Work/Study Hours": 9,
            "Fatigue Index": 3.2,
            "Stress Risk Score": 6,
        })
    }

    fn academic() -> InputSchema {
        DeploymentKind::Academic.schema()
    }

    #[test]
    fn academic_request_normalizes_in_schema_order() {
        let record = normalize(&academic(), &academic_request()).unwrap();
        assert_eq!(record.len(), 10);
        assert_eq!(
            record.vector(),
            vec![21.0, 4.0, 7.5, 2.0, 1.0, 1.0, 0.0, 9.0, 3.2, 6.0]
        );
        assert_eq!(
            record.get("Degree"),
            Some(&FeatureValue::Category {
                label: "Masters".into(),
                code: 1
            })
        );
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut req = academic_request();
        let obj = req.as_object_mut().unwrap();
        obj.remove("CGPA");
        obj.remove("Fatigue Index");
        let err = normalize(&academic(), &req).unwrap_err();
        assert_eq!(err, AssessError::MissingField("CGPA".into()));
    }

    #[test]
    fn unknown_category_rejects_whole_record() {
        let mut req = academic_request();
        req["Degree"] = json!("Associates");
        let err = normalize(&academic(), &req).unwrap_err();
        assert_eq!(
            err,
            AssessError::InvalidInput {
                fields: vec!["Degree".into()]
            }
        );
    }

    #[test]
    fn category_code_is_not_a_label() {
        let mut req = academic_request();
        req["Degree"] = json!(1);
        assert!(matches!(
            normalize(&academic(), &req),
            Err(AssessError::InvalidInput { .. })
        ));
    }

    #[test]
    fn every_bad_field_is_listed() {
        let mut req = academic_request();
        req["Age"] = json!("twenty");
        req["CGPA"] = Value::Null;
        req["Stress Risk Score"] = json!("NaN");
        let err = normalize(&academic(), &req).unwrap_err();
        assert_eq!(
            err,
            AssessError::InvalidInput {
                fields: vec!["Age".into(), "CGPA".into(), "Stress Risk Score".into()]
            }
        );
    }

    #[test]
    fn booleans_coerce_to_one_and_zero() {
        let mut req = academic_request();
        req["Dietary Habits"] = json!(true);
        let record = normalize(&academic(), &req).unwrap();
        assert_eq!(record.get("Dietary Habits"), Some(&FeatureValue::Number(1.0)));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = normalize(&academic(), &json!([1, 2, 3])).unwrap_err();
        assert_eq!(err, AssessError::NotAnObject);
    }

    #[test]
    fn essay_answers_are_text_without_vector() {
        let req = json!({"Q1": "I feel tired", "Q2": "Not much", "Q3": "Sometimes"});
        let record = normalize(&DeploymentKind::Essay.schema(), &req).unwrap();
        assert_eq!(record.len(), 3);
        assert!(record.vector().is_empty());
        assert_eq!(record.get("Q2").unwrap().to_string(), "Not much");
    }

    #[test]
    fn essay_blank_answer_is_invalid_and_absent_answer_is_missing() {
        let schema = DeploymentKind::Essay.schema();
        let blank = json!({"Q1": "ok", "Q2": "   ", "Q3": "ok"});
        assert_eq!(
            normalize(&schema, &blank).unwrap_err(),
            AssessError::InvalidInput {
                fields: vec!["Q2".into()]
            }
        );
        let absent = json!({"Q1": "ok", "Q3": "ok"});
        assert_eq!(
            normalize(&schema, &absent).unwrap_err(),
            AssessError::MissingField("Q2".into())
        );
    }

    #[test]
    fn tracks_are_mean_pooled_with_defaults() {
        let req = json!({
            "tracks": [
                {"danceability": 0.8, "energy": 0.6, "tempo": 120.0, "spectral_rolloff": 20_000_000.0},
                null,
                {"danceability": 0.4, "energy": 0.2, "tempo": 100.0}
            ]
        });
        let record = normalize(&DeploymentKind::Music.schema(), &req).unwrap();
        assert_eq!(record.len(), 10);
        let v = record.vector();
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.4).abs() < 1e-12);
        assert_eq!(v[2], 0.0, "absent loudness defaults to 0");
        assert!((v[8] - 110.0).abs() < 1e-12);
        assert!((v[9] - 1.0).abs() < 1e-12, "spec_rate = mean(rolloff / 1e7)");
    }

    #[test]
    fn empty_track_list_is_missing() {
        let schema = DeploymentKind::Music.schema();
        assert_eq!(
            normalize(&schema, &json!({"tracks": []})).unwrap_err(),
            AssessError::MissingField("tracks".into())
        );
        assert_eq!(
            normalize(&schema, &json!({"tracks": [null]})).unwrap_err(),
            AssessError::MissingField("tracks".into())
        );
        assert_eq!(
            normalize(&schema, &json!({})).unwrap_err(),
            AssessError::MissingField("tracks".into())
        );
    }

    #[test]
    fn non_numeric_track_feature_is_invalid() {
        let req = json!({"tracks": [{"energy": "loud"}, {"energy": "very"}]});
        assert_eq!(
            normalize(&DeploymentKind::Music.schema(), &req).unwrap_err(),
            AssessError::InvalidInput {
                fields: vec!["energy".into()]
            }
        );
    }

    #[test]
    fn overflowing_track_mean_is_invalid() {
        let req = json!({"tracks": [{"loudness": 1e308}, {"loudness": 1e308}, {"energy": 0.4}]});
        assert_eq!(
            normalize(&DeploymentKind::Music.schema(), &req).unwrap_err(),
            AssessError::InvalidInput {
                fields: vec!["loudness".into()]
            }
        );
    }

    #[test]
    fn large_finite_track_values_still_pool() {
        let req = json!({"tracks": [{"loudness": 1e300}, {"loudness": -1e300}]});
        let record = normalize(&DeploymentKind::Music.schema(), &req).unwrap();
        assert!(record.vector().iter().all(|v| v.is_finite()));
        assert_eq!(record.get("loudness"), Some(&FeatureValue::Number(0.0)));
    }
}
