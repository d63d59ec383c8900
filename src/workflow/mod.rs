//! Upload → preview → view workflow
//!
//! The controller owns the current step and the validated workbook; the two
//! stages it sequences each track their own loading flag, error message and
//! request sequence.

pub mod controller;
pub mod preview;
pub mod sequence;
pub mod upload;

pub use controller::{Step, WorkflowController, WorkflowEvent};
pub use preview::PreviewStage;
pub use sequence::{RequestSequence, Ticket};
pub use upload::{check_file_constraints, FileValidated, UploadStage};
