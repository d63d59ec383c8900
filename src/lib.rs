//! Nomina client - payroll workbook upload, preview and import
//!
//! This library drives the upload → validate → preview → import workflow of an
//! Excel payroll workbook against the Nomina REST API, then exposes the
//! imported employees through a client-side table engine and a statistics
//! transform.
//!
//! # Features
//!
//! - Typed REST client over the `{status, type, title, message, data}` envelope
//! - Workflow state machine with stale-response guarding per stage
//! - Employee table: search, exact filters, stable sort, pagination, CSV export
//! - Statistics transform with zero-safe averages
//! - Offline workbook inspection
//!
//! # Example
//!
//! ```no_run
//! use nomina_client::api::HttpApi;
//! use nomina_client::config::ClientConfig;
//! use nomina_client::types::UploadFile;
//! use nomina_client::workflow::{Step, WorkflowController};
//!
//! # async fn run() -> nomina_client::error::NominaResult<()> {
//! let config = ClientConfig::default();
//! let api = HttpApi::new(config.clone())?;
//! let mut controller = WorkflowController::new(config);
//!
//! let file = UploadFile::from_path("nomina.xlsx")?;
//! if controller.submit_file(file, &api).await {
//!     controller.load_preview(&api).await;
//!     controller.import(&api).await;
//! }
//! assert_eq!(controller.step(), Step::View);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod stats;
pub mod table;
pub mod types;
pub mod workbook;
pub mod workflow;

// Re-export commonly used types
pub use api::{ApiEnvelope, HttpApi, PayrollApi};
pub use config::ClientConfig;
pub use error::{NominaError, NominaResult};
pub use types::{Employee, ImportResult, Sexo, UploadFile, ValidationResult};
