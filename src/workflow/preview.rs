//! Preview stage: sheet selection, preview fetch and import

use std::time::Duration;

use tracing::{debug, info, warn};

use super::sequence::{RequestSequence, Ticket};
use crate::api::{ApiEnvelope, PayrollApi};
use crate::config::ClientConfig;
use crate::error::{NominaError, NominaResult};
use crate::types::{ImportResult, PreviewSheetData, UploadFile, ValidationResult};

const PREVIEW_FALLBACK: &str = "Error loading the preview";
const IMPORT_FALLBACK: &str = "Error importing the data";
const SELECTION_REQUIRED: &str = "Select at least one valid sheet";
const FILE_REQUIRED: &str = "No workbook loaded; upload a file first";
pub const IMPORT_CONFIRMATION: &str = "The data was loaded into the database successfully";

/// Request payload handed out by `begin_preview` / `begin_import`.
#[derive(Debug, Clone)]
pub struct SheetRequest {
    pub ticket: Ticket,
    pub file: UploadFile,
    pub sheets: Vec<String>,
}

pub struct PreviewStage {
    validation: ValidationResult,
    file: Option<UploadFile>,
    /// Insertion-ordered set, always a subset of the valid sheet names
    selected: Vec<String>,
    preview: Vec<PreviewSheetData>,
    show_preview: bool,
    active_tab: Option<String>,
    is_loading_preview: bool,
    is_importing: bool,
    import_message: Option<String>,
    import_error: Option<String>,
    last_import: Option<ImportResult>,
    preview_seq: RequestSequence,
    import_seq: RequestSequence,
    settle_delay: Duration,
}

impl PreviewStage {
    /// Every valid sheet starts selected; the first one is the active tab.
    pub fn new(validation: ValidationResult, file: Option<UploadFile>, config: &ClientConfig) -> Self {
        let selected = validation.valid_names();
        let active_tab = selected.first().cloned();
        Self {
            validation,
            file,
            selected,
            preview: Vec::new(),
            show_preview: false,
            active_tab,
            is_loading_preview: false,
            is_importing: false,
            import_message: None,
            import_error: None,
            last_import: None,
            preview_seq: RequestSequence::new(),
            import_seq: RequestSequence::new(),
            settle_delay: config.import_settle_delay(),
        }
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn selected_sheets(&self) -> &[String] {
        &self.selected
    }

    pub fn is_sheet_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Flip one sheet in or out of the selection and return the new list.
    /// Names that are not valid sheets are ignored.
    pub fn toggle_sheet(&mut self, name: &str) -> Vec<String> {
        if let Some(pos) = self.selected.iter().position(|s| s == name) {
            self.selected.remove(pos);
        } else if self.validation.is_valid_sheet(name) {
            self.selected.push(name.to_string());
        } else {
            debug!(sheet = name, "ignoring toggle of non-valid sheet");
        }
        self.selected.clone()
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    pub fn set_active_tab(&mut self, name: &str) {
        self.active_tab = Some(name.to_string());
    }

    pub fn preview_data(&self) -> &[PreviewSheetData] {
        &self.preview
    }

    pub fn preview_for_sheet(&self, name: &str) -> Option<&PreviewSheetData> {
        self.preview.iter().find(|p| p.sheet_name == name)
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    pub fn is_loading_preview(&self) -> bool {
        self.is_loading_preview
    }

    pub fn is_importing(&self) -> bool {
        self.is_importing
    }

    pub fn import_message(&self) -> Option<&str> {
        self.import_message.as_deref()
    }

    /// Last error of either the preview or the import call.
    pub fn import_error(&self) -> Option<&str> {
        self.import_error.as_deref()
    }

    pub fn last_import(&self) -> Option<&ImportResult> {
        self.last_import.as_ref()
    }

    fn sheet_request(&mut self, importing: bool) -> Option<SheetRequest> {
        let guard = match (&self.file, self.selected.is_empty()) {
            (None, _) => Some(FILE_REQUIRED),
            (Some(_), true) => Some(SELECTION_REQUIRED),
            _ => None,
        };
        if let Some(message) = guard {
            self.import_error = Some(message.to_string());
            return None;
        }
        let file = self.file.clone()?;
        let ticket = if importing {
            self.import_seq.issue()
        } else {
            self.preview_seq.issue()
        };
        Some(SheetRequest {
            ticket,
            file,
            sheets: self.selected.clone(),
        })
    }

    pub fn begin_preview(&mut self) -> Option<SheetRequest> {
        let request = self.sheet_request(false)?;
        self.is_loading_preview = true;
        self.import_error = None;
        Some(request)
    }

    /// Replace the preview wholesale with the response for `ticket`.
    pub fn complete_preview(
        &mut self,
        ticket: Ticket,
        outcome: NominaResult<ApiEnvelope<Vec<PreviewSheetData>>>,
    ) -> bool {
        if !self.preview_seq.is_current(ticket) {
            debug!(stage = "preview", ticket = ticket.value(), "discarding stale response");
            return false;
        }
        self.is_loading_preview = false;

        match outcome.and_then(|envelope| envelope.into_data(&[200], PREVIEW_FALLBACK)) {
            Ok(preview) => {
                debug!(sheets = preview.len(), "preview loaded");
                self.active_tab = preview.first().map(|p| p.sheet_name.clone());
                self.preview = preview;
                self.show_preview = true;
                true
            }
            Err(err) => {
                warn!(stage = "preview", "{}", err);
                self.import_error = Some(stage_message(&err, PREVIEW_FALLBACK));
                false
            }
        }
    }

    pub async fn load_preview(&mut self, api: &dyn PayrollApi) -> bool {
        let Some(request) = self.begin_preview() else {
            return false;
        };
        let outcome = api.preview_sheets(&request.file, &request.sheets).await;
        self.complete_preview(request.ticket, outcome)
    }

    pub fn begin_import(&mut self) -> Option<SheetRequest> {
        let request = self.sheet_request(true)?;
        self.is_importing = true;
        self.import_error = None;
        self.import_message = None;
        Some(request)
    }

    /// Apply the import response for `ticket`; 200 and 201 both succeed.
    pub fn complete_import(
        &mut self,
        ticket: Ticket,
        outcome: NominaResult<ApiEnvelope<ImportResult>>,
    ) -> Option<ImportResult> {
        if !self.import_seq.is_current(ticket) {
            debug!(stage = "import", ticket = ticket.value(), "discarding stale response");
            return None;
        }
        self.is_importing = false;

        let result = outcome.and_then(|envelope| {
            if envelope.is_status(&[200, 201]) {
                Ok(envelope.data.unwrap_or_default())
            } else {
                Err(envelope.failure(IMPORT_FALLBACK))
            }
        });
        match result {
            Ok(result) => {
                info!(
                    imported = result.imported_count,
                    sheets = result.sheets_processed.count(),
                    "import finished"
                );
                self.import_message = Some(IMPORT_CONFIRMATION.to_string());
                self.last_import = Some(result.clone());
                Some(result)
            }
            Err(err) => {
                warn!(stage = "import", "{}", err);
                self.import_error = Some(stage_message(&err, IMPORT_FALLBACK));
                None
            }
        }
    }

    /// Import the selected sheets. On success the confirmation stays visible
    /// for the configured settle delay before returning.
    pub async fn import_data(&mut self, api: &dyn PayrollApi) -> Option<ImportResult> {
        let request = self.begin_import()?;
        let outcome = api.import_sheets(&request.file, &request.sheets).await;
        let result = self.complete_import(request.ticket, outcome)?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Some(result)
    }
}

fn stage_message(err: &NominaError, fallback: &str) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
