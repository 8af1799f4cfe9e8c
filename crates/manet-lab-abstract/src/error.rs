use std::path::PathBuf;

use crate::flow::FlowId;

/// Errors produced while planning, running or recording a comparison run.
///
/// Every variant is fatal for the run: they describe configuration or
/// environment problems that have to be fixed before rerunning.
#[derive(thiserror::Error, Debug)]
pub enum LabError {
    /// Unknown protocol name or a non-positive / non-finite numeric parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The flow count does not fit in the port range starting at `base_port`.
    #[error("{flow_count} flows do not fit in the port range starting at {base_port}")]
    PortSpaceExhausted { flow_count: u32, base_port: u16 },
    /// The results log or the detailed record could not be written.
    #[error("failed to persist report to {}: {source}", .path.display())]
    ReportPersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The simulation engine refused an install request.
    #[error("simulation engine rejected request: {0}")]
    EngineRejected(String),
    /// The engine halted without completing the run; nothing can be aggregated.
    #[error("simulation did not complete: {0}")]
    RunIncomplete(String),
    /// Summing the engine's counters went past `u64::MAX`.
    #[error("{counter} total overflows while adding flow {flow}")]
    CounterOverflow { counter: &'static str, flow: FlowId },
    #[error("malformed results log at line {line}: {reason}")]
    MalformedResultsLog { line: usize, reason: String },
}

impl LabError {
    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        LabError::ReportPersistenceFailed {
            path: path.into(),
            source: source.into(),
        }
    }
}
