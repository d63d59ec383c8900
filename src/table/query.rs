//! Filter and sort derivation over the employee list

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::NominaError;
use crate::types::{Employee, Sexo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Id,
    Nombre,
    Edad,
    Sexo,
    Cargo,
    Sueldo,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Id,
        SortColumn::Nombre,
        SortColumn::Edad,
        SortColumn::Sexo,
        SortColumn::Cargo,
        SortColumn::Sueldo,
        SortColumn::CreatedAt,
        SortColumn::UpdatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Nombre => "nombre",
            SortColumn::Edad => "edad",
            SortColumn::Sexo => "sexo",
            SortColumn::Cargo => "cargo",
            SortColumn::Sueldo => "sueldo",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }

    /// Text columns compare case-insensitively, the rest natively.
    pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Nombre => cmp_text(&a.nombre, &b.nombre),
            SortColumn::Edad => a.edad.cmp(&b.edad),
            SortColumn::Sexo => cmp_text(a.sexo.as_str(), b.sexo.as_str()),
            SortColumn::Cargo => cmp_text(&a.cargo, &b.cargo),
            SortColumn::Sueldo => a.sueldo.total_cmp(&b.sueldo),
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
            SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = NominaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SortColumn::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                NominaError::LocalValidation(format!(
                    "Unknown sort column '{}' (expected one of: {})",
                    s,
                    SortColumn::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// View-only state; every change re-derives the filtered list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableViewState {
    pub search_term: String,
    pub filter_sexo: Option<Sexo>,
    pub filter_cargo: Option<String>,
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
}

impl TableViewState {
    fn matches(&self, employee: &Employee, term: Option<&str>) -> bool {
        if let Some(term) = term {
            let hit = employee.nombre.to_lowercase().contains(term)
                || employee.cargo.to_lowercase().contains(term)
                || employee.sexo.as_str().to_lowercase().contains(term);
            if !hit {
                return false;
            }
        }
        if let Some(sexo) = self.filter_sexo {
            if employee.sexo != sexo {
                return false;
            }
        }
        if let Some(cargo) = &self.filter_cargo {
            if &employee.cargo != cargo {
                return false;
            }
        }
        true
    }
}

/// Search, exact-match filters, then a stable sort. Pure: same inputs, same
/// ordered output.
pub fn derive_view(employees: &[Employee], state: &TableViewState) -> Vec<Employee> {
    let term = state.search_term.trim().to_lowercase();
    let term = (!term.is_empty()).then_some(term);

    let mut view: Vec<Employee> = employees
        .iter()
        .filter(|e| state.matches(e, term.as_deref()))
        .cloned()
        .collect();

    // sort_by is stable: ties keep their relative order in both directions.
    view.sort_by(|a, b| state.sort_direction.apply(state.sort_column.compare(a, b)));
    view
}
