//! CSV export of the filtered employee view

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{NominaError, NominaResult};
use crate::types::Employee;

pub const CSV_HEADERS: [&str; 7] = [
    "ID",
    "Nombre",
    "Edad",
    "Sexo",
    "Cargo",
    "Sueldo",
    "Fecha Creación",
];

pub const DEFAULT_EXPORT_NAME: &str = "empleados.csv";

/// Serialize `employees` in the fixed column order with every cell quoted.
pub fn employees_to_csv(employees: &[Employee]) -> NominaResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for e in employees {
        writer.write_record([
            e.id.to_string(),
            e.nombre.clone(),
            e.edad.to_string(),
            e.sexo.to_string(),
            e.cargo.clone(),
            e.sueldo.to_string(),
            e.created_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| NominaError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| NominaError::Decode(e.to_string()))
}
