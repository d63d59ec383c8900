//! Statistics transform: raw aggregate payload → per-gender and per-position
//! series.
//!
//! The transform is pure. [`StatisticsView`] wraps it with the loading and
//! error state of the statistics panel.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::api::{ApiEnvelope, PayrollApi};
use crate::error::NominaResult;
use crate::types::{GenderSummary, PositionSummary, RawStatistics, SalaryRange};
use crate::workflow::{RequestSequence, Ticket};

const STATS_FALLBACK: &str = "Error loading statistics";

/// Default number of positions shown in charts and terminal output.
pub const DEFAULT_TOP_POSITIONS: usize = 10;

/// One entry per gender key of the count map, in payload order.
///
/// `average_salary = total_salary / max(total_employees, 1)`; a gender with no
/// salary entry has a total of 0. Payloads without a count map fall back to a
/// pre-aggregated `by_sexo` series.
pub fn transform_by_sexo(raw: &RawStatistics) -> Vec<GenderSummary> {
    let Some(counts) = &raw.employees_by_gender else {
        return raw.by_sexo.clone().unwrap_or_default();
    };
    counts
        .iter()
        .map(|(sexo, count)| {
            let count = *count;
            let total_salary = raw.salary_by_gender.get(sexo).copied().unwrap_or(0.0);
            GenderSummary {
                sexo: sexo.clone(),
                total_employees: count,
                total_salary,
                average_salary: total_salary / count.max(1) as f64,
            }
        })
        .collect()
}

/// Position array mapped one to one, preserving input order.
pub fn transform_by_cargo(raw: &RawStatistics) -> Vec<PositionSummary> {
    match &raw.salary_by_position {
        Some(positions) => positions
            .iter()
            .map(|p| PositionSummary {
                cargo: p.cargo.clone(),
                total_employees: p.cantidad,
                average_salary: p.promedio_sueldo,
            })
            .collect(),
        None => raw.by_cargo.clone().unwrap_or_default(),
    }
}

/// Normalized statistics ready for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub total_employees: u64,
    pub total_payroll: f64,
    pub average_salary: f64,
    pub average_age: f64,
    pub salary_range: SalaryRange,
    pub by_sexo: Vec<GenderSummary>,
    pub by_cargo: Vec<PositionSummary>,
    pub age_distribution: BTreeMap<String, u64>,
}

impl Statistics {
    pub fn from_raw(raw: &RawStatistics) -> Self {
        Self {
            total_employees: raw.total_employees,
            total_payroll: raw.total_payroll,
            average_salary: raw.average_salary,
            average_age: raw.average_age,
            salary_range: raw.salary_range,
            by_sexo: transform_by_sexo(raw),
            by_cargo: transform_by_cargo(raw),
            age_distribution: raw.age_distribution.clone(),
        }
    }

    /// Display slice of the position series; the series itself is untouched.
    pub fn top_positions(&self, n: usize) -> &[PositionSummary] {
        &self.by_cargo[..n.min(self.by_cargo.len())]
    }
}

#[derive(Default)]
pub struct StatisticsView {
    statistics: Option<Statistics>,
    is_loading: bool,
    error_message: Option<String>,
    sequence: RequestSequence,
}

impl StatisticsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn begin_load(&mut self) -> Ticket {
        self.is_loading = true;
        self.error_message = None;
        self.sequence.issue()
    }

    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        outcome: NominaResult<ApiEnvelope<RawStatistics>>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            debug!(stage = "statistics", ticket = ticket.value(), "discarding stale response");
            return false;
        }
        self.is_loading = false;

        match outcome.and_then(|envelope| envelope.into_data(&[200], STATS_FALLBACK)) {
            Ok(raw) => {
                let stats = Statistics::from_raw(&raw);
                info!(
                    total_employees = stats.total_employees,
                    genders = stats.by_sexo.len(),
                    positions = stats.by_cargo.len(),
                    "statistics loaded"
                );
                self.statistics = Some(stats);
                true
            }
            Err(err) => {
                warn!(stage = "statistics", "{}", err);
                let message = err.user_message();
                self.error_message = Some(if message.trim().is_empty() {
                    STATS_FALLBACK.to_string()
                } else {
                    message
                });
                false
            }
        }
    }

    pub async fn load(&mut self, api: &dyn PayrollApi) -> bool {
        let ticket = self.begin_load();
        let outcome = api.statistics().await;
        self.complete_load(ticket, outcome)
    }
}
