//! CLI command handlers

pub mod commands;

pub use commands::{
    delete, employees, health, import, init_tracing, inspect, load_config, preview, stats,
    validate, EmployeeQuery,
};
