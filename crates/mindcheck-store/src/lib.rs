//! Storage layer: audit export of assessment results to Arrow and Parquet.

mod error;
pub use error::StoreError;

mod audit;
pub use audit::{batch_to_results, results_to_batch};

mod parquet_io;
pub use parquet_io::{export_results, read_parquet, read_results, write_parquet};
