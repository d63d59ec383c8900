//! Nomina REST API client
//!
//! `PayrollApi` is the seam to the external backend; `HttpApi` talks to it
//! over HTTP. Every call resolves to the response envelope so callers can
//! branch on the application status.

pub mod client;
pub mod envelope;

pub use client::{HttpApi, PayrollApi};
pub use envelope::{ApiEnvelope, ResponseKind};
