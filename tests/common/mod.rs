//! In-memory payroll backend shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use nomina_client::api::{ApiEnvelope, PayrollApi};
use nomina_client::config::ClientConfig;
use nomina_client::error::{NominaError, NominaResult};
use nomina_client::types::{
    Employee, EmployeeListing, ImportResult, InvalidSheet, PreviewSheetData, RawStatistics, Sexo,
    SheetsProcessed, UploadFile, ValidSheet, ValidationResult,
};

/// Canned responses per operation; a missing response is a transport failure.
#[derive(Default)]
pub struct FakeApi {
    pub validate_response: Mutex<Option<ApiEnvelope<ValidationResult>>>,
    pub preview_response: Mutex<Option<ApiEnvelope<Vec<PreviewSheetData>>>>,
    pub import_response: Mutex<Option<ApiEnvelope<ImportResult>>>,
    pub statistics_response: Mutex<Option<ApiEnvelope<RawStatistics>>>,
    pub employees: Mutex<Vec<Employee>>,
    pub last_sheets: Mutex<Vec<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: Vec<Employee>) -> Self {
        let api = Self::new();
        *api.employees.lock().unwrap() = employees;
        api
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|op| **op == operation)
            .count()
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }
}

fn canned<T: Clone>(slot: &Mutex<Option<ApiEnvelope<T>>>) -> NominaResult<ApiEnvelope<T>> {
    slot.lock()
        .unwrap()
        .clone()
        .ok_or_else(|| NominaError::Transport("connection refused".to_string()))
}

#[async_trait]
impl PayrollApi for FakeApi {
    async fn validate_workbook(
        &self,
        _file: &UploadFile,
    ) -> NominaResult<ApiEnvelope<ValidationResult>> {
        self.record("validate");
        canned(&self.validate_response)
    }

    async fn preview_sheets(
        &self,
        _file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<Vec<PreviewSheetData>>> {
        self.record("preview");
        *self.last_sheets.lock().unwrap() = sheets.to_vec();
        canned(&self.preview_response)
    }

    async fn import_sheets(
        &self,
        _file: &UploadFile,
        sheets: &[String],
    ) -> NominaResult<ApiEnvelope<ImportResult>> {
        self.record("import");
        *self.last_sheets.lock().unwrap() = sheets.to_vec();
        canned(&self.import_response)
    }

    async fn list_employees(
        &self,
        _skip: u32,
        _limit: u32,
    ) -> NominaResult<ApiEnvelope<EmployeeListing>> {
        self.record("list_employees");
        let employees = self.employees.lock().unwrap().clone();
        Ok(ApiEnvelope::new(
            200,
            "Empleados obtenidos",
            Some(EmployeeListing::Flat(employees)),
        ))
    }

    async fn delete_employee(&self, id: i64) -> NominaResult<ApiEnvelope<Value>> {
        self.record("delete_employee");
        let mut employees = self.employees.lock().unwrap();
        let before = employees.len();
        employees.retain(|e| e.id != id);
        if employees.len() == before {
            return Ok(ApiEnvelope::new(404, "Empleado no encontrado", None));
        }
        Ok(ApiEnvelope::new(200, "Empleado eliminado", Some(json!({"id": id}))))
    }

    async fn statistics(&self) -> NominaResult<ApiEnvelope<RawStatistics>> {
        self.record("statistics");
        canned(&self.statistics_response)
    }

    async fn health(&self) -> NominaResult<ApiEnvelope<Value>> {
        self.record("health");
        Ok(ApiEnvelope::new(200, "healthy", None))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

pub fn employee(id: i64, nombre: &str, sexo: Sexo, cargo: &str, sueldo: f64) -> Employee {
    Employee {
        id,
        nombre: nombre.to_string(),
        edad: 25 + (id % 30) as u32,
        sexo,
        cargo: cargo.to_string(),
        sueldo,
        created_at: None,
        updated_at: None,
    }
}

/// `n` employees cycling through three genders and four positions.
pub fn staff(n: i64) -> Vec<Employee> {
    let sexos = [Sexo::Masculino, Sexo::Femenino, Sexo::Otro];
    let cargos = ["Operario", "Analista", "Gerente", "Cajero"];
    (1..=n)
        .map(|i| {
            employee(
                i,
                &format!("Empleado {:03}", i),
                sexos[(i as usize) % 3],
                cargos[(i as usize) % 4],
                900.0 + (i * 37 % 500) as f64,
            )
        })
        .collect()
}

pub fn validation(valid: &[&str], invalid: &[&str]) -> ValidationResult {
    ValidationResult {
        valid_sheets: valid
            .iter()
            .map(|name| ValidSheet {
                name: name.to_string(),
                rows: 12,
                columns: vec!["nombre".into(), "edad".into(), "sexo".into()],
            })
            .collect(),
        invalid_sheets: invalid
            .iter()
            .map(|name| InvalidSheet {
                name: name.to_string(),
                rows: 0,
                errors: vec!["Columnas faltantes: sueldo".into()],
            })
            .collect(),
        total_sheets: (valid.len() + invalid.len()) as u64,
        valid_count: valid.len() as u64,
        invalid_count: invalid.len() as u64,
    }
}

pub fn preview_for(sheets: &[&str]) -> Vec<PreviewSheetData> {
    sheets
        .iter()
        .map(|name| PreviewSheetData {
            sheet_name: name.to_string(),
            headers: vec!["nombre".into(), "edad".into()],
            rows: vec![json!({"nombre": "Ana", "edad": 30})],
            total_rows: 12,
        })
        .collect()
}

pub fn import_result(sheets: &[&str]) -> ImportResult {
    ImportResult {
        imported_count: 24,
        error_count: 0,
        sheets_processed: SheetsProcessed::Names(sheets.iter().map(|s| s.to_string()).collect()),
        filename: Some("nomina.xlsx".into()),
    }
}

pub fn workbook() -> UploadFile {
    UploadFile::from_bytes("nomina.xlsx", vec![0x50, 0x4b, 0x03, 0x04])
}

/// Default config without the post-import pause.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        import_settle_ms: 0,
        ..ClientConfig::default()
    }
}
