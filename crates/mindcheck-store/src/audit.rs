//! FusedResult ↔ Arrow RecordBatch, using the fixed audit schema.

use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use mindcheck_core::schema::export::assessment_schema;
use mindcheck_core::{DeploymentKind, FusedResult, ProbabilitySource};

use crate::error::StoreError;

pub fn results_to_batch(results: &[FusedResult]) -> Result<RecordBatch, StoreError> {
    let identifier: StringArray = results.iter().map(|r| r.identifier.as_deref()).collect();
    let deployment = StringArray::from_iter_values(results.iter().map(|r| r.deployment.as_str()));
    let label = StringArray::from_iter_values(results.iter().map(|r| r.label.as_str()));
    let model_probability = Float64Array::from_iter_values(results.iter().map(|r| r.model_probability));
    let reported_probability =
        Float64Array::from_iter_values(results.iter().map(|r| r.reported_probability));
    let probability_source =
        StringArray::from_iter_values(results.iter().map(|r| r.probability_source.as_str()));
    let narrative_degraded: BooleanArray =
        results.iter().map(|r| Some(r.narrative_degraded)).collect();
    let narrative_text =
        StringArray::from_iter_values(results.iter().map(|r| r.narrative_text.as_str()));
    let assessed_at = TimestampMillisecondArray::from_iter_values(
        results.iter().map(|r| r.assessed_at.timestamp_millis()),
    )
    .with_timezone("UTC");

    Ok(RecordBatch::try_new(
        Arc::new(assessment_schema()),
        vec![
            Arc::new(identifier),
            Arc::new(deployment),
            Arc::new(label),
            Arc::new(model_probability),
            Arc::new(reported_probability),
            Arc::new(probability_source),
            Arc::new(narrative_degraded),
            Arc::new(narrative_text),
            Arc::new(assessed_at),
        ],
    )?)
}

pub fn batch_to_results(batch: &RecordBatch) -> Result<Vec<FusedResult>, StoreError> {
    let identifier = column::<StringArray>(batch, "identifier")?;
    let deployment = column::<StringArray>(batch, "deployment")?;
    let label = column::<StringArray>(batch, "label")?;
    let model_probability = column::<Float64Array>(batch, "model_probability")?;
    let reported_probability = column::<Float64Array>(batch, "reported_probability")?;
    let probability_source = column::<StringArray>(batch, "probability_source")?;
    let narrative_degraded = column::<BooleanArray>(batch, "narrative_degraded")?;
    let narrative_text = column::<StringArray>(batch, "narrative_text")?;
    let assessed_at = column::<TimestampMillisecondArray>(batch, "assessed_at")?;

    (0..batch.num_rows())
        .map(|i| {
            let kind: DeploymentKind = deployment
                .value(i)
                .parse()
                .map_err(|reason| column_error("deployment", reason))?;
            let source = match probability_source.value(i) {
                "narrative" => ProbabilitySource::Narrative,
                "model" => ProbabilitySource::Model,
                other => {
                    return Err(column_error(
                        "probability_source",
                        format!("unknown source '{other}'"),
                    ));
                }
            };
            let millis = assessed_at.value(i);
            let assessed_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                column_error("assessed_at", format!("timestamp {millis} out of range"))
            })?;

            Ok(FusedResult {
                deployment: kind,
                label: label.value(i).to_string(),
                model_probability: model_probability.value(i),
                reported_probability: reported_probability.value(i),
                probability_source: source,
                narrative_text: narrative_text.value(i).to_string(),
                narrative_degraded: narrative_degraded.value(i),
                identifier: (!identifier.is_null(i)).then(|| identifier.value(i).to_string()),
                assessed_at,
            })
        })
        .collect()
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, StoreError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| column_error(name, "missing"))?;
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        column_error(name, format!("unexpected type {}", col.data_type()))
    })
}

fn column_error(column: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Column {
        column: column.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mindcheck_core::FALLBACK_NARRATIVE;

    pub(crate) fn sample_results() -> Vec<FusedResult> {
        vec![
            FusedResult {
                deployment: DeploymentKind::Academic,
                label: "Depression".into(),
                model_probability: 0.7,
                reported_probability: 42.0,
                probability_source: ProbabilitySource::Narrative,
                narrative_text: "Academic Stress Probability: 42%".into(),
                narrative_degraded: false,
                identifier: Some("student-17".into()),
                assessed_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            },
            FusedResult {
                deployment: DeploymentKind::Essay,
                label: "Unassessed".into(),
                model_probability: 0.5,
                reported_probability: 50.0,
                probability_source: ProbabilitySource::Model,
                narrative_text: FALLBACK_NARRATIVE.into(),
                narrative_degraded: true,
                identifier: None,
                assessed_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap(),
            },
        ]
    }

    #[test]
    fn batch_matches_schema() {
        let batch = results_to_batch(&sample_results()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 9);
        assert_eq!(batch.schema().as_ref(), &assessment_schema());

        let ids = column::<StringArray>(&batch, "identifier").unwrap();
        assert_eq!(ids.value(0), "student-17");
        assert!(ids.is_null(1));
    }

    #[test]
    fn back_to_results() {
        let results = sample_results();
        let batch = results_to_batch(&results).unwrap();
        assert_eq!(batch_to_results(&batch).unwrap(), results);
    }

    #[test]
    fn empty_input_gives_empty_batch() {
        let batch = results_to_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert!(batch_to_results(&batch).unwrap().is_empty());
    }

    #[test]
    fn wrong_schema_is_column_error() {
        let batch = RecordBatch::try_from_iter(vec![(
            "label",
            Arc::new(StringArray::from(vec!["x"])) as Arc<dyn Array>,
        )])
        .unwrap();
        let err = batch_to_results(&batch).unwrap_err();
        assert!(err.to_string().contains("identifier"));
    }
}
