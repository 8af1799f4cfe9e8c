pub mod aggregator;
pub mod engine;
pub mod flow_plan;
pub mod history;
pub mod report_writer;
pub mod scenario_runner;
pub mod trace;

pub use aggregator::aggregate;
pub use engine::ReplayEngine;
pub use flow_plan::{BASE_PORT, FlowPlan, rate_label};
pub use history::ResultsHistory;
pub use report_writer::{CSV_HEADER, DEFAULT_RESULTS_LOG, ReportWriter};
pub use scenario_runner::run_scenario;
pub use trace::DetailedRecord;
