//! The `view` step: employee table and statistics panel.
//!
//! Both reload whenever the workflow controller bumps its reload generation,
//! which happens once per completed import.

use tokio::sync::watch;
use tracing::debug;

use crate::api::PayrollApi;
use crate::config::ClientConfig;
use crate::stats::StatisticsView;
use crate::table::EmployeeTable;

pub struct Dashboard {
    table: EmployeeTable,
    statistics: StatisticsView,
    reload: watch::Receiver<u64>,
    seen_generation: Option<u64>,
}

impl Dashboard {
    pub fn new(config: &ClientConfig, reload: watch::Receiver<u64>) -> Self {
        Self {
            table: EmployeeTable::new(config),
            statistics: StatisticsView::new(),
            reload,
            seen_generation: None,
        }
    }

    pub fn table(&self) -> &EmployeeTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut EmployeeTable {
        &mut self.table
    }

    pub fn statistics(&self) -> &StatisticsView {
        &self.statistics
    }

    /// True before the first load and after every unseen reload signal.
    pub fn needs_reload(&self) -> bool {
        self.seen_generation != Some(*self.reload.borrow())
    }

    /// Reload both panels if a newer generation was signalled. Returns whether
    /// a reload ran.
    pub async fn refresh_if_signalled(&mut self, api: &dyn PayrollApi) -> bool {
        if !self.needs_reload() {
            return false;
        }
        self.reload_all(api).await;
        true
    }

    /// Unconditionally reload the table and the statistics.
    pub async fn reload_all(&mut self, api: &dyn PayrollApi) {
        let generation = *self.reload.borrow_and_update();
        debug!(generation, "reloading dashboard");
        self.table.load(api).await;
        self.statistics.load(api).await;
        self.seen_generation = Some(generation);
    }
}
