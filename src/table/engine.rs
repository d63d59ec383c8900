//! Employee table engine: bulk load, derived view, paging, export, delete

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::export::employees_to_csv;
use super::pager::{page_window, total_pages};
use super::query::{derive_view, SortColumn, SortDirection, TableViewState};
use crate::api::{ApiEnvelope, PayrollApi};
use crate::config::ClientConfig;
use crate::error::{NominaError, NominaResult};
use crate::types::{Employee, EmployeeListing, Sexo};
use crate::workflow::{RequestSequence, Ticket};

const LOAD_FALLBACK: &str = "Error loading employees";
const DELETE_FALLBACK: &str = "Error deleting the employee";

pub struct EmployeeTable {
    employees: Vec<Employee>,
    filtered: Vec<Employee>,
    state: TableViewState,
    current_page: usize,
    page_size: usize,
    window: usize,
    fetch_limit: u32,
    total_employees: u64,
    unique_sexos: Vec<Sexo>,
    unique_cargos: Vec<String>,
    is_loading: bool,
    error_message: Option<String>,
    sequence: RequestSequence,
}

impl EmployeeTable {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            employees: Vec::new(),
            filtered: Vec::new(),
            state: TableViewState::default(),
            current_page: 1,
            page_size: config.page_size.max(1),
            window: config.page_window.max(1),
            fetch_limit: config.employee_fetch_limit,
            total_employees: 0,
            unique_sexos: Vec::new(),
            unique_cargos: Vec::new(),
            is_loading: false,
            error_message: None,
            sequence: RequestSequence::new(),
        }
    }

    //==========================================================================
    // Loading
    //==========================================================================

    pub fn begin_load(&mut self) -> Ticket {
        self.is_loading = true;
        self.error_message = None;
        self.sequence.issue()
    }

    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        outcome: NominaResult<ApiEnvelope<EmployeeListing>>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            debug!(stage = "employees", ticket = ticket.value(), "discarding stale response");
            return false;
        }
        self.is_loading = false;

        match outcome.and_then(|envelope| envelope.into_data(&[200], LOAD_FALLBACK)) {
            Ok(listing) => {
                let total = listing.total();
                self.set_employees(listing.into_employees());
                self.total_employees = total;
                info!(loaded = self.employees.len(), total, "employees loaded");
                true
            }
            Err(err) => {
                warn!(stage = "employees", "{}", err);
                self.error_message = Some(message_or(&err, LOAD_FALLBACK));
                false
            }
        }
    }

    /// Fetch the whole collection in one request and re-derive the view.
    pub async fn load(&mut self, api: &dyn PayrollApi) -> bool {
        let ticket = self.begin_load();
        let outcome = api.list_employees(0, self.fetch_limit).await;
        self.complete_load(ticket, outcome)
    }

    /// Replace the held list, rebuild filter options and the view.
    pub fn set_employees(&mut self, employees: Vec<Employee>) {
        self.total_employees = employees.len() as u64;
        self.employees = employees;
        self.extract_unique_values();
        self.apply_filters();
    }

    fn extract_unique_values(&mut self) {
        let mut sexos: Vec<Sexo> = Vec::new();
        for e in &self.employees {
            if !sexos.contains(&e.sexo) {
                sexos.push(e.sexo);
            }
        }
        sexos.sort_by_key(|s| s.as_str());
        self.unique_sexos = sexos;

        self.unique_cargos = self
            .employees
            .iter()
            .map(|e| e.cargo.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
    }

    //==========================================================================
    // Derived view
    //==========================================================================

    /// Recompute the filtered list from scratch and go back to page 1.
    pub fn apply_filters(&mut self) {
        self.filtered = derive_view(&self.employees, &self.state);
        self.current_page = 1;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.state.search_term = term.into();
        self.apply_filters();
    }

    pub fn set_filter_sexo(&mut self, sexo: Option<Sexo>) {
        self.state.filter_sexo = sexo;
        self.apply_filters();
    }

    pub fn set_filter_cargo(&mut self, cargo: Option<String>) {
        self.state.filter_cargo = cargo.filter(|c| !c.is_empty());
        self.apply_filters();
    }

    /// Same column flips the direction; a new column starts ascending.
    pub fn sort_by(&mut self, column: SortColumn) {
        if self.state.sort_column == column {
            self.state.sort_direction = self.state.sort_direction.toggled();
        } else {
            self.state.sort_column = column;
            self.state.sort_direction = SortDirection::Asc;
        }
        self.apply_filters();
    }

    pub fn set_sort(&mut self, column: SortColumn, direction: SortDirection) {
        self.state.sort_column = column;
        self.state.sort_direction = direction;
        self.apply_filters();
    }

    pub fn clear_filters(&mut self) {
        self.state.search_term.clear();
        self.state.filter_sexo = None;
        self.state.filter_cargo = None;
        self.apply_filters();
    }

    pub fn state(&self) -> &TableViewState {
        &self.state
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn filtered(&self) -> &[Employee] {
        &self.filtered
    }

    pub fn unique_sexos(&self) -> &[Sexo] {
        &self.unique_sexos
    }

    pub fn unique_cargos(&self) -> &[String] {
        &self.unique_cargos
    }

    pub fn total_employees(&self) -> u64 {
        self.total_employees
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    //==========================================================================
    // Pagination
    //==========================================================================

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.page_size)
    }

    /// Rows of the current page.
    pub fn paginated(&self) -> &[Employee] {
        let start = ((self.current_page - 1) * self.page_size).min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }

    /// Jump to page `n`; out-of-range requests leave the page unchanged.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        if n < 1 || n > self.total_pages() {
            return false;
        }
        self.current_page = n;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.current_page > 1 && self.go_to_page(self.current_page - 1)
    }

    /// Page numbers to offer for navigation.
    pub fn page_numbers(&self) -> Vec<usize> {
        page_window(self.current_page, self.total_pages(), self.window)
    }

    /// 1-based first and last row shown on the current page.
    pub fn showing_range(&self) -> Option<(usize, usize)> {
        let page = self.paginated();
        if page.is_empty() {
            return None;
        }
        let first = (self.current_page - 1) * self.page_size + 1;
        Some((first, first + page.len() - 1))
    }

    //==========================================================================
    // Export and delete
    //==========================================================================

    /// CSV of the whole filtered view, not only the current page.
    pub fn export_csv(&self) -> NominaResult<String> {
        employees_to_csv(&self.filtered)
    }

    pub fn export_csv_to<P: AsRef<Path>>(&self, path: P) -> NominaResult<usize> {
        let csv = self.export_csv()?;
        std::fs::write(path.as_ref(), csv)?;
        Ok(self.filtered.len())
    }

    /// Remove the record from memory only; the backend is not told.
    ///
    /// Placeholder for deployments without a delete endpoint. Prefer
    /// `delete_remote`.
    pub fn delete_local_only(&mut self, id: i64) -> bool {
        let before = self.employees.len();
        self.employees.retain(|e| e.id != id);
        if self.employees.len() == before {
            return false;
        }
        warn!(id, "employee removed locally only; backend still holds it");
        self.total_employees = self.total_employees.saturating_sub(1);
        self.extract_unique_values();
        self.apply_filters();
        true
    }

    /// Delete on the backend, then drop the record locally.
    pub async fn delete_remote(&mut self, api: &dyn PayrollApi, id: i64) -> NominaResult<()> {
        let envelope = api.delete_employee(id).await?;
        if !envelope.is_status(&[200, 204]) {
            let err = envelope.failure(DELETE_FALLBACK);
            self.error_message = Some(message_or(&err, DELETE_FALLBACK));
            return Err(err);
        }
        info!(id, "employee deleted");
        let before = self.employees.len();
        self.employees.retain(|e| e.id != id);
        if self.employees.len() != before {
            self.total_employees = self.total_employees.saturating_sub(1);
            self.extract_unique_values();
            self.apply_filters();
        }
        Ok(())
    }
}

fn message_or(err: &NominaError, fallback: &str) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
