//! Parquet files on disk.

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use mindcheck_core::FusedResult;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tracing::info;

use crate::audit::{batch_to_results, results_to_batch};
use crate::error::StoreError;

/// Write batches to a single Parquet file, replacing any existing file.
/// All batches must share the first batch's schema.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<usize, StoreError> {
    let Some(first) = batches.first() else {
        return Ok(0);
    };
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), Some(props))?;
    let mut rows = 0;
    for batch in batches {
        writer.write(batch)?;
        rows += batch.num_rows();
    }
    writer.close()?;
    info!(path = %path.display(), rows, "wrote parquet");
    Ok(rows)
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Export assessment results to a Parquet audit file.
pub fn export_results(path: &Path, results: &[FusedResult]) -> Result<usize, StoreError> {
    let batch = results_to_batch(results)?;
    write_parquet(path, &[batch])
}

/// Read an audit file back into results.
pub fn read_results(path: &Path) -> Result<Vec<FusedResult>, StoreError> {
    let mut results = Vec::new();
    for batch in read_parquet(path)? {
        results.extend(batch_to_results(&batch)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::tests::sample_results;
    use tempfile::TempDir;

    #[test]
    fn export_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.parquet");
        let results = sample_results();

        assert_eq!(export_results(&path, &results).unwrap(), 2);
        assert_eq!(read_results(&path).unwrap(), results);
    }

    #[test]
    fn read_parquet_keeps_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.parquet");
        export_results(&path, &sample_results()).unwrap();

        let batches = read_parquet(&path).unwrap();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 2);
        assert_eq!(
            batches[0].schema().field_with_name("assessed_at").unwrap().data_type(),
            mindcheck_core::schema::export::assessment_schema()
                .field_with_name("assessed_at")
                .unwrap()
                .data_type()
        );
    }

    #[test]
    fn missing_file() {
        let err = read_parquet(Path::new("/nonexistent/audit.parquet")).unwrap_err();
        assert!(matches!(err, StoreError::ParquetNotFound(_)));
    }

    #[test]
    fn nothing_to_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.parquet");
        assert_eq!(write_parquet(&path, &[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn freshly_assembled_results_survive_export() {
        use mindcheck_core::{DeploymentKind, EstimatorResult, NarrativeResult, assemble, resolve};

        let est = EstimatorResult::new("Depression", 0.64);
        let results: Vec<FusedResult> = (0..3)
            .map(|i| {
                assemble(
                    DeploymentKind::Academic,
                    &est,
                    resolve(&est, Some(40.0 + f64::from(i))),
                    &NarrativeResult::success(format!("Academic Stress Probability: {}%", 40 + i)),
                    Some(format!("user-{i}")),
                )
            })
            .collect();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.parquet");
        export_results(&path, &results).unwrap();
        assert_eq!(read_results(&path).unwrap(), results);
    }
}
