mod check;
mod operation;
mod report;

pub use check::CheckRecord;
pub use operation::{report_operation, OperationRecord};
pub use report::{
    CheckCount, CheckTally, InMemoryReporter, JsonlFileReporter, OperationSummary, ReportCollector,
    ReportConfig, Reporter,
};

pub mod prelude {
    pub use crate::check::CheckRecord;
    pub use crate::operation::{report_operation, OperationRecord};
    pub use crate::report::{CheckCount, CheckTally, ReportCollector, ReportConfig, Reporter};
}
