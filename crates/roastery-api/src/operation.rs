//! Per-operation metadata
//!
//! Every service operation declares an [`OperationMeta`] constant and runs its
//! body through [`track`], which logs the outcome and records Prometheus
//! counters. Latency is only recorded when `measure_performance` is set.

use std::future::Future;
use std::time::Instant;

use crate::metrics;

/// Whether an operation mutates state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Command,
    Query,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Command => "command",
            OperationKind::Query => "query",
        }
    }
}

/// Static description of a service operation
#[derive(Debug, Clone, Copy)]
pub struct OperationMeta {
    pub name: &'static str,
    pub kind: OperationKind,
    pub measure_performance: bool,
}

impl OperationMeta {
    pub const fn command(name: &'static str) -> Self {
        Self {
            name,
            kind: OperationKind::Command,
            measure_performance: true,
        }
    }

    pub const fn query(name: &'static str) -> Self {
        Self {
            name,
            kind: OperationKind::Query,
            measure_performance: false,
        }
    }

    pub const fn measured(mut self) -> Self {
        self.measure_performance = true;
        self
    }
}

/// Run an operation, recording its outcome and optionally its latency
pub async fn track<T, E, F>(meta: OperationMeta, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = future.await;
    let elapsed = start.elapsed();
    let kind = meta.kind.as_str();

    match &result {
        Ok(_) => {
            tracing::debug!(
                operation = meta.name,
                kind,
                elapsed_ms = elapsed.as_millis() as u64,
                "Operation completed"
            );
        }
        Err(e) => {
            tracing::debug!(
                operation = meta.name,
                kind,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Operation failed"
            );
        }
    }

    metrics::record_operation(meta.name, kind, result.is_ok());
    if meta.measure_performance {
        metrics::record_operation_time(meta.name, kind, elapsed);
    }

    result
}
