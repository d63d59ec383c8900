//! Upload stage: local file checks, then the remote validate call

use std::path::Path;

use tracing::{debug, info, warn};

use super::sequence::{RequestSequence, Ticket};
use crate::api::{ApiEnvelope, PayrollApi};
use crate::config::ClientConfig;
use crate::error::{NominaError, NominaResult};
use crate::types::{file_extension, UploadFile, ValidationResult};

const VALIDATE_FALLBACK: &str = "Error validating the file";
const TRANSPORT_FALLBACK: &str = "Error processing the file";

/// Emitted once the backend accepted the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidated {
    pub validation: ValidationResult,
    pub file: UploadFile,
}

/// Extension and size checks applied before any request is sent.
pub fn check_file_constraints(name: &str, size: u64, config: &ClientConfig) -> NominaResult<()> {
    let allowed = file_extension(name)
        .map(|ext| config.allowed_extensions.iter().any(|a| *a == ext))
        .unwrap_or(false);
    if !allowed {
        return Err(NominaError::LocalValidation(format!(
            "Only Excel files ({}) are allowed",
            config.allowed_extensions.join(", ")
        )));
    }
    if size > config.max_upload_bytes {
        return Err(NominaError::LocalValidation(format!(
            "The file must not exceed {}MB",
            config.max_upload_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

pub struct UploadStage {
    config: ClientConfig,
    selected_file: Option<UploadFile>,
    is_validating: bool,
    error_message: Option<String>,
    sequence: RequestSequence,
}

impl UploadStage {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
            selected_file: None,
            is_validating: false,
            error_message: None,
            sequence: RequestSequence::new(),
        }
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.selected_file.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.selected_file.as_ref().map(UploadFile::name)
    }

    pub fn is_validating(&self) -> bool {
        self.is_validating
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Accept a candidate workbook. Rejections only set the error message.
    pub fn handle_file(&mut self, file: UploadFile) -> bool {
        self.error_message = None;
        match check_file_constraints(file.name(), file.size(), &self.config) {
            Ok(()) => {
                debug!(file = file.name(), size = file.size(), "file accepted");
                self.selected_file = Some(file);
                true
            }
            Err(err) => {
                warn!(file = file.name(), "file rejected: {}", err);
                self.error_message = Some(err.user_message());
                false
            }
        }
    }

    /// Like `handle_file`, but checks the on-disk size before reading it.
    pub fn handle_path<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        self.error_message = None;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let loaded = std::fs::metadata(path)
            .map_err(NominaError::from)
            .and_then(|meta| check_file_constraints(&name, meta.len(), &self.config))
            .and_then(|()| UploadFile::from_path(path));
        match loaded {
            Ok(file) => self.handle_file(file),
            Err(err) => {
                self.error_message = Some(err.user_message());
                false
            }
        }
    }

    pub fn remove_file(&mut self) {
        self.selected_file = None;
        self.error_message = None;
    }

    /// Forget the file and drop any in-flight validation.
    pub fn reset(&mut self) {
        self.remove_file();
        self.is_validating = false;
        self.sequence.invalidate();
    }

    /// Start a validation round trip. `None` when no file was accepted.
    pub fn begin_validation(&mut self) -> Option<(Ticket, UploadFile)> {
        let Some(file) = self.selected_file.clone() else {
            self.error_message = Some("Select an Excel file first".to_string());
            return None;
        };
        self.is_validating = true;
        self.error_message = None;
        Some((self.sequence.issue(), file))
    }

    /// Apply the response for `ticket`. Stale tickets are ignored.
    pub fn complete_validation(
        &mut self,
        ticket: Ticket,
        outcome: NominaResult<ApiEnvelope<ValidationResult>>,
    ) -> Option<FileValidated> {
        if !self.sequence.is_current(ticket) {
            debug!(stage = "validate", ticket = ticket.value(), "discarding stale response");
            return None;
        }
        self.is_validating = false;

        let file = self.selected_file.clone()?;
        let validation = outcome.and_then(|envelope| envelope.into_data(&[200], VALIDATE_FALLBACK));
        match validation {
            Ok(validation) => {
                info!(
                    file = file.name(),
                    valid = validation.valid_count,
                    invalid = validation.invalid_count,
                    "workbook validated"
                );
                Some(FileValidated { validation, file })
            }
            Err(err) => {
                warn!(stage = "validate", "{}", err);
                let message = err.user_message();
                self.error_message = Some(if message.trim().is_empty() {
                    TRANSPORT_FALLBACK.to_string()
                } else {
                    message
                });
                None
            }
        }
    }

    pub async fn validate_file(&mut self, api: &dyn PayrollApi) -> Option<FileValidated> {
        let (ticket, file) = self.begin_validation()?;
        let outcome = api.validate_workbook(&file).await;
        self.complete_validation(ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn test_constraints_accept_excel_files() {
        assert!(check_file_constraints("nomina.xlsx", 1024, &config()).is_ok());
        assert!(check_file_constraints("NOMINA.XLS", 1024, &config()).is_ok());
    }

    #[test]
    fn test_constraints_reject_other_extensions() {
        for name in ["nomina.csv", "nomina", "nomina.xlsx.pdf", "xlsx"] {
            let err = check_file_constraints(name, 10, &config()).unwrap_err();
            assert!(err.is_local(), "{name} should be rejected locally");
        }
    }

    #[test]
    fn test_constraints_size_limit_is_inclusive() {
        let limit = config().max_upload_bytes;
        assert!(check_file_constraints("a.xlsx", limit, &config()).is_ok());
        let err = check_file_constraints("a.xlsx", limit + 1, &config()).unwrap_err();
        assert_eq!(err.user_message(), "The file must not exceed 10MB");
    }

    #[test]
    fn test_handle_file_keeps_previous_selection_on_reject() {
        let mut stage = UploadStage::new(&config());
        assert!(stage.handle_file(UploadFile::from_bytes("ok.xlsx", vec![0; 4])));
        assert!(!stage.handle_file(UploadFile::from_bytes("bad.txt", vec![0; 4])));
        assert_eq!(stage.file_name(), Some("ok.xlsx"));
        assert!(stage.error_message().is_some());
    }

    #[test]
    fn test_begin_validation_without_file() {
        let mut stage = UploadStage::new(&config());
        assert!(stage.begin_validation().is_none());
        assert!(!stage.is_validating());
        assert!(stage.error_message().is_some());
    }

    #[test]
    fn test_stale_validation_is_discarded() {
        let mut stage = UploadStage::new(&config());
        stage.handle_file(UploadFile::from_bytes("a.xlsx", vec![1]));
        let (old, _) = stage.begin_validation().unwrap();
        let (current, _) = stage.begin_validation().unwrap();

        let ok = ApiEnvelope::new(200, "", Some(ValidationResult::default()));
        assert!(stage.complete_validation(old, Ok(ok.clone())).is_none());
        assert!(stage.is_validating());
        assert!(stage.complete_validation(current, Ok(ok)).is_some());
        assert!(!stage.is_validating());
    }

    #[test]
    fn test_application_failure_sets_message() {
        let mut stage = UploadStage::new(&config());
        stage.handle_file(UploadFile::from_bytes("a.xlsx", vec![1]));
        let (ticket, _) = stage.begin_validation().unwrap();
        let env: ApiEnvelope<ValidationResult> = ApiEnvelope::new(400, "Archivo corrupto", None);
        assert!(stage.complete_validation(ticket, Ok(env)).is_none());
        assert_eq!(stage.error_message(), Some("Archivo corrupto"));
        assert!(!stage.is_validating());
    }

    #[test]
    fn test_empty_transport_message_uses_fallback() {
        let mut stage = UploadStage::new(&config());
        stage.handle_file(UploadFile::from_bytes("a.xlsx", vec![1]));
        let (ticket, _) = stage.begin_validation().unwrap();
        let outcome = Err(NominaError::Transport(String::new()));
        assert!(stage.complete_validation(ticket, outcome).is_none());
        assert_eq!(stage.error_message(), Some(TRANSPORT_FALLBACK));
    }
}
