use anyhow::{Context, Result};
use manet_lab_abstract::{
    FlowStatsSnapshot, GeneratorRequest, LabError, RoutingProtocol, RunOutcome,
    SimulationEngine, SinkRequest,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Flow-monitor output recorded by an external simulator run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplayDocument {
    /// Protocol the recording was made with; `None` accepts any protocol.
    #[serde(default)]
    protocol: Option<RoutingProtocol>,
    #[serde(default = "default_completed")]
    completed: bool,
    #[serde(default)]
    reason: Option<String>,
    flows: FlowStatsSnapshot,
}

fn default_completed() -> bool {
    true
}

/// Engine adapter that replays a recorded flow-monitor snapshot.
///
/// Install requests are checked and kept, so a replay fails the same way a
/// live engine would when handed a plan it cannot run.
#[derive(Debug)]
pub struct ReplayEngine {
    document: ReplayDocument,
    routing: Option<(RoutingProtocol, u32)>,
    generators: Vec<GeneratorRequest>,
    sinks: Vec<SinkRequest>,
}

impl ReplayEngine {
    pub fn from_json(content: &str) -> Result<Self> {
        let document: ReplayDocument =
            serde_json::from_str(content).context("Failed to parse flow stats snapshot")?;
        Ok(Self {
            document,
            routing: None,
            generators: Vec::new(),
            sinks: Vec::new(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read flow stats snapshot {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid flow stats snapshot {}", path.display()))
    }

    pub fn generators(&self) -> &[GeneratorRequest] {
        &self.generators
    }

    pub fn sinks(&self) -> &[SinkRequest] {
        &self.sinks
    }

    fn node_count(&self) -> Result<u32, LabError> {
        self.routing.map(|(_, nodes)| nodes).ok_or_else(|| {
            LabError::EngineRejected("routing must be installed before traffic".into())
        })
    }

    fn check_node(&self, node: u32) -> Result<(), LabError> {
        let node_count = self.node_count()?;
        if node >= node_count {
            return Err(LabError::EngineRejected(format!(
                "node {node} does not exist (network has {node_count} nodes)"
            )));
        }
        Ok(())
    }
}

impl SimulationEngine for ReplayEngine {
    fn install_routing(
        &mut self,
        protocol: RoutingProtocol,
        node_count: u32,
    ) -> Result<(), LabError> {
        if let Some(recorded) = self.document.protocol
            && recorded != protocol
        {
            return Err(LabError::EngineRejected(format!(
                "snapshot was recorded with {recorded}, not {protocol}"
            )));
        }

        info!(
            "Replaying {} ({}) over {} nodes",
            protocol,
            if protocol.is_proactive() {
                "proactive"
            } else {
                "reactive"
            },
            node_count
        );
        self.routing = Some((protocol, node_count));
        Ok(())
    }

    fn install_generator(&mut self, request: GeneratorRequest) -> Result<(), LabError> {
        self.check_node(request.source_node)?;
        self.check_node(request.dest_node)?;
        debug!(
            "Generator for flow {}: {} -> {}:{} at {}",
            request.flow_index,
            request.source_node,
            request.dest_node,
            request.dest_port,
            request.rate_label
        );
        self.generators.push(request);
        Ok(())
    }

    fn install_sink(&mut self, request: SinkRequest) -> Result<(), LabError> {
        self.check_node(request.node)?;
        if self.sinks.iter().any(|s| s.node == request.node && s.port == request.port) {
            return Err(LabError::EngineRejected(format!(
                "port {} already bound on node {}",
                request.port, request.node
            )));
        }
        self.sinks.push(request);
        Ok(())
    }

    fn run(&mut self, stop_secs: f64) -> RunOutcome {
        if self.routing.is_none() {
            return RunOutcome::Incomplete {
                reason: "no routing protocol installed".into(),
            };
        }
        if !self.document.completed {
            return RunOutcome::Incomplete {
                reason: self
                    .document
                    .reason
                    .clone()
                    .unwrap_or_else(|| "recorded run did not complete".into()),
            };
        }

        info!(
            "Replayed run to {}s: {} generators installed, {} flows observed",
            stop_secs,
            self.generators.len(),
            self.document.flows.len()
        );
        RunOutcome::Completed(self.document.flows.clone())
    }
}
