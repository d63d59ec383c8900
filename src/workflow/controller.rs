//! Workflow controller: `upload → preview → view`, plus reset

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, info};

use super::preview::PreviewStage;
use super::upload::{FileValidated, UploadStage};
use crate::api::PayrollApi;
use crate::config::ClientConfig;
use crate::types::{ImportResult, UploadFile, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Upload,
    Preview,
    View,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Upload => "upload",
            Step::Preview => "preview",
            Step::View => "view",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    FileValidated(FileValidated),
    SheetsSelected(Vec<String>),
    ImportComplete,
    BackToUpload,
}

pub struct WorkflowController {
    config: ClientConfig,
    step: Step,
    validation: Option<ValidationResult>,
    file: Option<UploadFile>,
    selected_sheets: Vec<String>,
    show_employees: bool,
    upload: UploadStage,
    preview: Option<PreviewStage>,
    reload: watch::Sender<u64>,
}

impl WorkflowController {
    pub fn new(config: ClientConfig) -> Self {
        let (reload, _) = watch::channel(0);
        Self {
            upload: UploadStage::new(&config),
            config,
            step: Step::Upload,
            validation: None,
            file: None,
            selected_sheets: Vec::new(),
            show_employees: false,
            preview: None,
            reload,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn selected_sheets(&self) -> &[String] {
        &self.selected_sheets
    }

    pub fn show_employees(&self) -> bool {
        self.show_employees
    }

    pub fn upload(&self) -> &UploadStage {
        &self.upload
    }

    pub fn upload_mut(&mut self) -> &mut UploadStage {
        &mut self.upload
    }

    pub fn preview(&self) -> Option<&PreviewStage> {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> Option<&mut PreviewStage> {
        self.preview.as_mut()
    }

    /// Views that must reload after an import subscribe here. The value is a
    /// generation counter bumped once per completed import.
    pub fn subscribe_reload(&self) -> watch::Receiver<u64> {
        self.reload.subscribe()
    }

    pub fn reload_generation(&self) -> u64 {
        *self.reload.borrow()
    }

    pub fn dispatch(&mut self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::FileValidated(FileValidated { validation, file }) => {
                let has_valid = validation.has_valid_sheets();
                self.file = Some(file.clone());
                if !has_valid {
                    // Back on upload so the invalid sheets can be shown; a
                    // selection from an earlier workbook must not survive.
                    info!(file = file.name(), "no valid sheets; returning to upload");
                    self.validation = Some(validation);
                    self.preview = None;
                    self.selected_sheets.clear();
                    self.transition(Step::Upload);
                    return;
                }
                let stage = PreviewStage::new(validation.clone(), Some(file), &self.config);
                self.selected_sheets = stage.selected_sheets().to_vec();
                self.validation = Some(validation);
                self.preview = Some(stage);
                self.transition(Step::Preview);
            }
            WorkflowEvent::SheetsSelected(sheets) => {
                self.selected_sheets = sheets;
            }
            WorkflowEvent::ImportComplete => {
                self.show_employees = true;
                self.reload.send_modify(|generation| *generation += 1);
                self.transition(Step::View);
            }
            WorkflowEvent::BackToUpload => self.reset_upload(),
        }
    }

    /// "Choose another file" from the preview or view step.
    pub fn back_to_upload(&mut self) {
        self.dispatch(WorkflowEvent::BackToUpload);
    }

    /// Back to `upload` from any step, dropping the workbook and any
    /// in-flight validation.
    pub fn reset_upload(&mut self) {
        self.validation = None;
        self.file = None;
        self.selected_sheets.clear();
        self.show_employees = false;
        self.preview = None;
        self.upload.reset();
        self.transition(Step::Upload);
    }

    fn transition(&mut self, next: Step) {
        if self.step != next {
            debug!(from = %self.step, to = %next, "workflow transition");
        }
        self.step = next;
    }

    //==========================================================================
    // Drivers: run a stage operation and feed its event back in
    //==========================================================================

    /// Accept `file` and validate it. Returns true when the workflow moved to
    /// `preview`.
    pub async fn submit_file(&mut self, file: UploadFile, api: &dyn PayrollApi) -> bool {
        if !self.upload.handle_file(file) {
            return false;
        }
        self.validate(api).await
    }

    /// Validate the file already accepted by the upload stage.
    pub async fn validate(&mut self, api: &dyn PayrollApi) -> bool {
        match self.upload.validate_file(api).await {
            Some(validated) => {
                self.dispatch(WorkflowEvent::FileValidated(validated));
                self.step == Step::Preview
            }
            None => false,
        }
    }

    pub fn toggle_sheet(&mut self, name: &str) -> Vec<String> {
        let Some(stage) = self.preview.as_mut() else {
            return Vec::new();
        };
        let sheets = stage.toggle_sheet(name);
        self.dispatch(WorkflowEvent::SheetsSelected(sheets.clone()));
        sheets
    }

    pub async fn load_preview(&mut self, api: &dyn PayrollApi) -> bool {
        match self.preview.as_mut() {
            Some(stage) => stage.load_preview(api).await,
            None => false,
        }
    }

    /// Import the selected sheets; on success the workflow reaches `view`.
    pub async fn import(&mut self, api: &dyn PayrollApi) -> Option<ImportResult> {
        let stage = self.preview.as_mut()?;
        let result = stage.import_data(api).await?;
        self.dispatch(WorkflowEvent::ImportComplete);
        Some(result)
    }
}
