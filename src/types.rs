use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{NominaError, NominaResult};

//==============================================================================
// Workbook upload
//==============================================================================

/// A workbook held in memory for the validate → preview → import round trips.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    contents: Arc<[u8]>,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a workbook from disk. Size checks belong to the caller, see
    /// `workflow::check_file_constraints`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> NominaResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let contents = std::fs::read(path)?;
        Ok(Self::from_bytes(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Lowercased extension including the dot, e.g. `.xlsx`.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.name)
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some(".xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some(".xls") => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

pub(crate) fn file_extension(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx..].to_lowercase())
}

//==============================================================================
// Validation / preview / import payloads
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidSheet {
    pub name: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidSheet {
    pub name: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Server verdict on an uploaded workbook. Immutable once received.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub valid_sheets: Vec<ValidSheet>,
    #[serde(default)]
    pub invalid_sheets: Vec<InvalidSheet>,
    #[serde(default)]
    pub total_sheets: u64,
    #[serde(default)]
    pub valid_count: u64,
    #[serde(default)]
    pub invalid_count: u64,
}

impl ValidationResult {
    pub fn has_valid_sheets(&self) -> bool {
        !self.valid_sheets.is_empty()
    }

    /// Valid sheet names in server order
    pub fn valid_names(&self) -> Vec<String> {
        self.valid_sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_valid_sheet(&self, name: &str) -> bool {
        self.valid_sheets.iter().any(|s| s.name == name)
    }
}

/// Preview rows for one sheet; rows are opaque records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSheetData {
    pub sheet_name: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default, alias = "data")]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_rows: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetsProcessed {
    Names(Vec<String>),
    Count(u64),
}

impl Default for SheetsProcessed {
    fn default() -> Self {
        SheetsProcessed::Count(0)
    }
}

impl SheetsProcessed {
    pub fn count(&self) -> u64 {
        match self {
            SheetsProcessed::Names(names) => names.len() as u64,
            SheetsProcessed::Count(n) => *n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default, alias = "imported_rows")]
    pub imported_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub sheets_processed: SheetsProcessed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

//==============================================================================
// Employees
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sexo {
    Masculino,
    Femenino,
    Otro,
}

impl Sexo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sexo::Masculino => "Masculino",
            Sexo::Femenino => "Femenino",
            Sexo::Otro => "Otro",
        }
    }
}

impl fmt::Display for Sexo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sexo {
    type Err = NominaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "masculino" | "m" => Ok(Sexo::Masculino),
            "femenino" | "f" => Ok(Sexo::Femenino),
            "otro" | "o" => Ok(Sexo::Otro),
            other => Err(NominaError::LocalValidation(format!(
                "Unknown sexo '{}' (expected Masculino, Femenino or Otro)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub nombre: String,
    pub edad: u32,
    pub sexo: Sexo,
    pub cargo: String,
    pub sueldo: f64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

/// The listing endpoint answers either with a bare array or a page object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeListing {
    Flat(Vec<Employee>),
    Paged {
        employees: Vec<Employee>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl EmployeeListing {
    pub fn total(&self) -> u64 {
        match self {
            EmployeeListing::Flat(list) => list.len() as u64,
            EmployeeListing::Paged { employees, total } => {
                total.unwrap_or(employees.len() as u64)
            }
        }
    }

    pub fn into_employees(self) -> Vec<Employee> {
        match self {
            EmployeeListing::Flat(list) => list,
            EmployeeListing::Paged { employees, .. } => employees,
        }
    }
}

/// Backend timestamps come both naive (`2025-10-23T10:30:00`) and with an
/// offset; offsets are normalized to UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.naive_utc()));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}

/// A JSON object of counts read as `(key, count)` pairs in document order.
mod ordered_counts {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &Option<Vec<(String, u64)>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let Some(pairs) = value else {
            return serializer.serialize_none();
        };
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, count) in pairs {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<(String, u64)>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs: Option<Pairs> = Option::deserialize(deserializer)?;
        Ok(pairs.map(|p| p.0))
    }

    struct Pairs(Vec<(String, u64)>);

    impl<'de> Deserialize<'de> for Pairs {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(PairsVisitor)
        }
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Pairs;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of counts")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Pairs, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, count)) = access.next_entry::<String, u64>()? {
                match pairs.iter_mut().find(|(k, _)| *k == key) {
                    Some(existing) => existing.1 = count,
                    None => pairs.push((key, count)),
                }
            }
            Ok(Pairs(pairs))
        }
    }
}

//==============================================================================
// Statistics payload
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

/// One entry of the raw `salary_by_position` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAggregate {
    pub cargo: String,
    #[serde(default)]
    pub promedio_sueldo: f64,
    #[serde(default)]
    pub cantidad: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderSummary {
    pub sexo: String,
    pub total_employees: u64,
    #[serde(default)]
    pub total_salary: f64,
    pub average_salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    pub cargo: String,
    pub total_employees: u64,
    pub average_salary: f64,
}

/// Aggregate payload as sent by `/statistics`. Every field is optional on the
/// wire; the per-gender and per-position series may arrive either as raw maps
/// or already aggregated (`by_sexo` / `by_cargo`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawStatistics {
    #[serde(default)]
    pub total_employees: u64,
    #[serde(default)]
    pub total_payroll: f64,
    #[serde(default)]
    pub average_salary: f64,
    #[serde(default)]
    pub average_age: f64,
    #[serde(default)]
    pub salary_range: SalaryRange,
    /// Kept in payload order; the per-gender series follows it.
    #[serde(default, with = "ordered_counts")]
    pub employees_by_gender: Option<Vec<(String, u64)>>,
    #[serde(default)]
    pub salary_by_gender: BTreeMap<String, f64>,
    #[serde(default)]
    pub salary_by_position: Option<Vec<PositionAggregate>>,
    #[serde(default)]
    pub age_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_sexo: Option<Vec<GenderSummary>>,
    #[serde(default)]
    pub by_cargo: Option<Vec<PositionSummary>>,
}
