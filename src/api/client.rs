//! HTTP implementation of the payroll backend contract

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::envelope::{failure_message, ApiEnvelope};
use crate::config::ClientConfig;
use crate::error::{NominaError, NominaResult};
use crate::types::{
    EmployeeListing, ImportResult, PreviewSheetData, RawStatistics, UploadFile, ValidationResult,
};

/// Backend operations consumed by the workflow, table and statistics views.
///
/// `Ok` means an envelope was received, whatever its `status`; `Err` means
/// the call failed before one could be read (transport, HTTP error, or a
/// malformed success payload).
#[async_trait]
pub trait PayrollApi: Send + Sync {
    async fn validate_workbook(
        &self,
        file: &UploadFile,
    ) -> NominaResult<ApiEnvelope<ValidationResult>>;

    async fn preview_sheets(
        &self,
        file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<Vec<PreviewSheetData>>>;

    async fn import_sheets(
        &self,
        file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<ImportResult>>;

    async fn list_employees(
        &self,
        skip: u32,
        limit: u32,
    ) -> NominaResult<ApiEnvelope<EmployeeListing>>;

    async fn delete_employee(&self, id: i64) -> NominaResult<ApiEnvelope<Value>>;

    async fn statistics(&self) -> NominaResult<ApiEnvelope<RawStatistics>>;

    async fn health(&self) -> NominaResult<ApiEnvelope<Value>>;
}

pub struct HttpApi {
    client: Client,
    config: ClientConfig,
}

impl HttpApi {
    pub fn new(config: ClientConfig) -> NominaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("nomina-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn workbook_form(file: &UploadFile, sheets: Option<&[String]>) -> NominaResult<Form> {
        let part = Part::bytes(file.contents().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())?;
        let mut form = Form::new().part("file", part);
        if let Some(sheets) = sheets {
            form = form.text("sheets", serde_json::to_string(sheets)?);
        }
        Ok(form)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> NominaResult<ApiEnvelope<T>> {
        let request_id = Uuid::new_v4().to_string();
        debug!(operation, %request_id, "sending request");

        let response = request
            .header("X-Request-Id", request_id.as_str())
            .send()
            .await?;
        let http_status = response.status();
        let body = response.text().await?;

        if !http_status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| failure_message(&value));
            warn!(operation, %request_id, status = http_status.as_u16(), "request failed");
            return Err(match message {
                Some(message) => NominaError::Api {
                    status: http_status.as_u16(),
                    message,
                },
                None => NominaError::Transport(format!("{operation}: HTTP {http_status}")),
            });
        }

        let raw: ApiEnvelope<Value> = serde_json::from_str(&body)
            .map_err(|e| NominaError::Decode(format!("{operation}: {e}")))?;
        debug!(operation, %request_id, status = raw.status, "response received");
        raw.decode().map_err(|e| match e {
            NominaError::Decode(message) => NominaError::Decode(format!("{operation}: {message}")),
            other => other,
        })
    }
}

#[async_trait]
impl PayrollApi for HttpApi {
    async fn validate_workbook(
        &self,
        file: &UploadFile,
    ) -> NominaResult<ApiEnvelope<ValidationResult>> {
        let form = Self::workbook_form(file, None)?;
        let request = self
            .client
            .post(self.config.endpoint("excel/validate"))
            .multipart(form);
        self.send("validate", request).await
    }

    async fn preview_sheets(
        &self,
        file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<Vec<PreviewSheetData>>> {
        let form = Self::workbook_form(file, Some(sheets))?;
        let request = self
            .client
            .post(self.config.endpoint("excel/preview"))
            .multipart(form);
        self.send("preview", request).await
    }

    async fn import_sheets(
        &self,
        file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<ImportResult>> {
        let form = Self::workbook_form(file, Some(sheets))?;
        let request = self
            .client
            .post(self.config.endpoint("excel/import"))
            .multipart(form);
        self.send("import", request).await
    }

    async fn list_employees(
        &self,
        skip: u32,
        limit: u32,
    ) -> NominaResult<ApiEnvelope<EmployeeListing>> {
        let request = self
            .client
            .get(self.config.endpoint("employees"))
            .query(&[("skip", skip), ("limit", limit)]);
        self.send("list_employees", request).await
    }

    async fn delete_employee(&self, id: i64) -> NominaResult<ApiEnvelope<Value>> {
        let request = self
            .client
            .delete(self.config.endpoint(&format!("employees/{id}")));
        self.send("delete_employee", request).await
    }

    async fn statistics(&self) -> NominaResult<ApiEnvelope<RawStatistics>> {
        let request = self.client.get(self.config.endpoint("statistics"));
        self.send("statistics", request).await
    }

    async fn health(&self) -> NominaResult<ApiEnvelope<Value>> {
        let request = self.client.get(self.config.root_endpoint("health"));
        self.send("health", request).await
    }
}
