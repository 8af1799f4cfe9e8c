use serde::Serialize;

use crate::error::LabError;
use crate::flow::FlowStatsSnapshot;
use crate::protocol::RoutingProtocol;

/// Constant-rate traffic generator to install on a flow's source node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorRequest {
    pub flow_index: u32,
    pub source_node: u32,
    pub dest_node: u32,
    pub dest_port: u16,
    pub rate_label: String,
    pub packet_size: u32,
    pub start_secs: f64,
    pub stop_secs: f64,
}

/// Packet sink to install on a flow's destination node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkRequest {
    pub flow_index: u32,
    pub node: u32,
    pub port: u16,
    pub start_secs: f64,
    pub stop_secs: f64,
}

/// How a simulation run ended.
///
/// The counters are only reachable through [`RunOutcome::Completed`], so
/// nothing can be aggregated from a run the engine did not finish.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(FlowStatsSnapshot),
    Incomplete { reason: String },
}

/// The simulation engine that actually moves packets.
/// Radio, MAC, mobility and the routing protocols all live behind this trait.
pub trait SimulationEngine {
    /// Select the routing protocol for every node.
    fn install_routing(
        &mut self,
        protocol: RoutingProtocol,
        node_count: u32,
    ) -> Result<(), LabError>;

    /// Install a constant-rate generator sending to `dest_node:dest_port`.
    fn install_generator(&mut self, request: GeneratorRequest) -> Result<(), LabError>;

    /// Install a sink listening on `node:port`.
    fn install_sink(&mut self, request: SinkRequest) -> Result<(), LabError>;

    /// Run to `stop_secs` and hand back the per-flow counters.
    /// Called once, after every install request.
    fn run(&mut self, stop_secs: f64) -> RunOutcome;
}
