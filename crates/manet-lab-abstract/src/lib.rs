pub mod config;
pub mod error;
pub mod flow;
pub mod interface;
pub mod protocol;
pub mod report;
pub mod scenario;

pub use config::{ScenarioConfig, WARM_UP_OFFSET_SECS};
pub use error::LabError;
pub use flow::{Flow, FlowId, FlowStats, FlowStatsSnapshot};
pub use interface::{GeneratorRequest, RunOutcome, SimulationEngine, SinkRequest};
pub use protocol::RoutingProtocol;
pub use report::AggregateReport;
pub use scenario::ConfigOverride;
