use std::time::Duration;

use tabled::Tabled;

use crate::report::OperationSummary;

#[derive(Tabled)]
pub struct OperationRow {
    pub operation_id: String,
    pub total_operations: usize,
    pub errors: usize,
    #[tabled(display = "float2_or_dash")]
    pub avg_time_ms: Option<f64>,
    #[tabled(display = "float2_or_dash")]
    pub min_time_ms: Option<f64>,
    #[tabled(display = "float2_or_dash")]
    pub max_time_ms: Option<f64>,
    #[tabled(display = "float2_or_dash")]
    pub p95_time_ms: Option<f64>,
}

impl From<OperationSummary> for OperationRow {
    fn from(summary: OperationSummary) -> Self {
        Self {
            operation_id: summary.operation_id,
            total_operations: summary.total_operations,
            errors: summary.errors,
            avg_time_ms: summary.avg_time.map(as_ms),
            min_time_ms: summary.min_time.map(as_ms),
            max_time_ms: summary.max_time.map(as_ms),
            p95_time_ms: summary.p95_time.map(as_ms),
        }
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

fn float2_or_dash(n: &Option<f64>) -> String {
    match n {
        Some(n) => format!("{n:.2}"),
        None => "-".to_string(),
    }
}
