//! Statistical validation of simulation output.
//!
//! Observation sequences from a finished run are reduced to batch means,
//! checked for residual autocorrelation and turned into Student-t
//! confidence intervals, which are then compared with closed-form
//! queueing-theory values.
//!
//! # Example
//!
//! ```
//! use queuesim_validation::{BatchMeansSample, ConfidenceInterval};
//!
//! let data: Vec<f64> = (0..640).map(|i| (i % 10) as f64).collect();
//! let sample = BatchMeansSample::new(&data, 64, 0.95);
//! assert_eq!(sample.batch_means.len(), 64);
//! assert!(sample.interval.contains(4.5));
//! ```

mod adaptive;
mod autocorrelation;
mod batch;
mod error;
mod interval;
mod report;
mod student;
pub mod theory;

pub use adaptive::{select_batch_count, DEFAULT_BATCH_CANDIDATES};
pub use autocorrelation::{autocorrelation, lag1_autocorrelation, Autocorrelation};
pub use batch::{batch_means, BatchMeansSample};
pub use error::ValidationError;
pub use interval::ConfidenceInterval;
pub use report::{validate, CheckRow, ObservationSet, TotalResponse, ValidationReport, Validator};
pub use student::{ln_gamma, regularized_incomplete_beta, student_t_cdf, student_t_quantile};
pub use theory::TheoryTable;
