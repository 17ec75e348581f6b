//! Example file loading and report writing for the canopy pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExampleSet, SkippedRow};
pub use error::IoError;
pub use reader::ExampleReader;
pub use writer::{EvaluationReport, FeatureEntry, ReportWriter, TestSummary};
