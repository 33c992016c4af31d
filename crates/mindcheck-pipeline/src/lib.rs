//! Assessment pipeline: a deployment's fixed configuration plus the
//! [`Assessor`] that runs one request through every stage.

pub mod assessor;
pub mod batch;
pub mod deployment;

pub use assessor::{Assessor, Prepared, read_identifier};
pub use batch::{BatchOutcome, BatchStats, parse_jsonl, run_batch};
pub use deployment::{ACADEMIC, Deployment, ESSAY, MUSIC};
