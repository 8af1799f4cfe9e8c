use manet_lab_abstract::{
    Flow, GeneratorRequest, LabError, ScenarioConfig, SimulationEngine, SinkRequest,
    WARM_UP_OFFSET_SECS,
};
use serde::Serialize;
use tracing::{debug, info};

/// Port of flow 0; flow `i` uses `BASE_PORT + i`.
pub const BASE_PORT: u16 = 9000;

/// Seconds subtracted from the run length when estimating the offered load:
/// the warm-up plus one second for generators to reach their steady rate.
const LOAD_ESTIMATE_MARGIN_SECS: f64 = 2.0;

/// Format a per-flow data rate for the engine's traffic generators.
///
/// Sub-megabit rates are expressed as whole kbps so that parsers never see a
/// fractional Mbps value.
pub fn rate_label(data_rate_mbps: f64) -> String {
    if data_rate_mbps < 1.0 {
        // f64::round rounds half away from zero
        let kbps = (data_rate_mbps * 1000.0).round() as i64;
        format!("{kbps}kbps")
    } else {
        format!("{data_rate_mbps}Mbps")
    }
}

/// The set of flows derived from a [`ScenarioConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPlan {
    flows: Vec<Flow>,
    rate_label: String,
    packet_size: u32,
    start_secs: f64,
    stop_secs: f64,
    expected_tx_per_flow: u64,
}

impl FlowPlan {
    pub fn new(config: &ScenarioConfig) -> Result<Self, LabError> {
        let available_ports = u32::from(u16::MAX) - u32::from(BASE_PORT) + 1;
        if config.flow_count() > available_ports {
            return Err(LabError::PortSpaceExhausted {
                flow_count: config.flow_count(),
                base_port: BASE_PORT,
            });
        }

        let rate_label = rate_label(config.data_rate_mbps());
        let node_count = config.node_count();
        let flows = (0..config.flow_count())
            .map(|index| {
                let slot = index % node_count;
                Flow {
                    index,
                    source_node: slot,
                    dest_node: (node_count - 1) - slot,
                    // Bounded by the port range check above
                    port: BASE_PORT + index as u16,
                    rate_label: rate_label.clone(),
                }
            })
            .collect();

        let packets_per_sec =
            config.data_rate_mbps() * 1e6 / (f64::from(config.packet_size()) * 8.0);
        // Saturating cast: a run shorter than the margin expects nothing
        let expected_tx_per_flow =
            (packets_per_sec * (config.sim_duration() - LOAD_ESTIMATE_MARGIN_SECS)) as u64;

        Ok(Self {
            flows,
            rate_label,
            packet_size: config.packet_size(),
            start_secs: WARM_UP_OFFSET_SECS,
            stop_secs: config.sim_duration(),
            expected_tx_per_flow,
        })
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn rate_label(&self) -> &str {
        &self.rate_label
    }

    /// Window `[start, stop)` in which generators and sinks are active.
    pub fn active_window(&self) -> (f64, f64) {
        (self.start_secs, self.stop_secs)
    }

    /// Rough number of packets each generator should emit.
    pub fn expected_tx_per_flow(&self) -> u64 {
        self.expected_tx_per_flow
    }

    pub fn expected_tx_total(&self) -> u64 {
        self.expected_tx_per_flow
            .saturating_mul(self.flows.len() as u64)
    }

    /// Ask the engine for one generator and one sink per flow.
    pub fn install(&self, engine: &mut dyn SimulationEngine) -> Result<(), LabError> {
        info!(
            "Expected packets per flow ≈ {}  -> total ≈ {}",
            self.expected_tx_per_flow,
            self.expected_tx_total()
        );

        for flow in &self.flows {
            info!("{flow}");
            engine.install_generator(GeneratorRequest {
                flow_index: flow.index,
                source_node: flow.source_node,
                dest_node: flow.dest_node,
                dest_port: flow.port,
                rate_label: flow.rate_label.clone(),
                packet_size: self.packet_size,
                start_secs: self.start_secs,
                stop_secs: self.stop_secs,
            })?;
            engine.install_sink(SinkRequest {
                flow_index: flow.index,
                node: flow.dest_node,
                port: flow.port,
                start_secs: self.start_secs,
                stop_secs: self.stop_secs,
            })?;
        }

        debug!("Installed {} generator/sink pairs", self.flows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manet_lab_abstract::{RoutingProtocol, RunOutcome};
    use std::collections::HashSet;

    fn config(nodes: u32, flows: u32, rate: f64) -> ScenarioConfig {
        ScenarioConfig::new(RoutingProtocol::Aodv, nodes, flows, 1024, 150.0, rate).unwrap()
    }

    #[test]
    fn endpoints_and_ports_follow_the_index() {
        let plan = FlowPlan::new(&config(7, 20, 0.128)).unwrap();
        assert_eq!(plan.flows().len(), 20);

        let ports: HashSet<u16> = plan.flows().iter().map(|f| f.port).collect();
        assert_eq!(ports.len(), 20);

        for flow in plan.flows() {
            assert_eq!(flow.source_node, flow.index % 7);
            assert_eq!(flow.dest_node, 6 - (flow.index % 7));
            assert_eq!(flow.port, BASE_PORT + flow.index as u16);
        }
        assert!(plan.flows().windows(2).all(|w| w[0].port < w[1].port));
    }

    #[test]
    fn default_scenario_pairs_mirror_nodes() {
        let plan = FlowPlan::new(&ScenarioConfig::default()).unwrap();
        let first = &plan.flows()[0];
        assert_eq!((first.source_node, first.dest_node, first.port), (0, 49, 9000));
        let last = &plan.flows()[9];
        assert_eq!((last.source_node, last.dest_node, last.port), (9, 40, 9009));
    }

    #[test]
    fn single_node_yields_self_addressed_flows() {
        let plan = FlowPlan::new(&config(1, 4, 0.128)).unwrap();
        assert!(
            plan.flows()
                .iter()
                .all(|f| f.source_node == 0 && f.dest_node == 0)
        );
    }

    #[test]
    fn rate_labels_avoid_fractional_mbps() {
        assert_eq!(rate_label(0.128), "128kbps");
        assert_eq!(rate_label(0.0005), "1kbps");
        assert_eq!(rate_label(0.9994), "999kbps");
        assert_eq!(rate_label(2.0), "2Mbps");
        assert_eq!(rate_label(1.5), "1.5Mbps");
    }

    #[test]
    fn port_space_is_bounded() {
        let max_flows = u32::from(u16::MAX) - u32::from(BASE_PORT) + 1;
        let plan = FlowPlan::new(&config(50, max_flows, 0.128)).unwrap();
        assert_eq!(plan.flows().last().unwrap().port, u16::MAX);

        let err = FlowPlan::new(&config(50, max_flows + 1, 0.128)).unwrap_err();
        assert!(matches!(err, LabError::PortSpaceExhausted { .. }));
    }

    #[test]
    fn identical_configs_give_identical_plans() {
        let a = FlowPlan::new(&config(13, 40, 0.256)).unwrap();
        let b = FlowPlan::new(&config(13, 40, 0.256)).unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn expected_load_uses_rate_and_packet_size() {
        // 128 kbps of 1024-byte packets is 15.625 packets/s over 148 s
        let plan = FlowPlan::new(&ScenarioConfig::default()).unwrap();
        assert_eq!(plan.expected_tx_per_flow(), 2312);
        assert_eq!(plan.expected_tx_total(), 23120);
    }

    #[derive(Default)]
    struct RecordingEngine {
        generators: Vec<GeneratorRequest>,
        sinks: Vec<SinkRequest>,
    }

    impl SimulationEngine for RecordingEngine {
        fn install_routing(&mut self, _: RoutingProtocol, _: u32) -> Result<(), LabError> {
            Ok(())
        }

        fn install_generator(&mut self, request: GeneratorRequest) -> Result<(), LabError> {
            self.generators.push(request);
            Ok(())
        }

        fn install_sink(&mut self, request: SinkRequest) -> Result<(), LabError> {
            self.sinks.push(request);
            Ok(())
        }

        fn run(&mut self, _: f64) -> RunOutcome {
            RunOutcome::Incomplete {
                reason: "recording only".into(),
            }
        }
    }

    #[test]
    fn install_requests_one_pair_per_flow() {
        let plan = FlowPlan::new(&config(5, 3, 2.0)).unwrap();
        let mut engine = RecordingEngine::default();
        plan.install(&mut engine).unwrap();

        assert_eq!(engine.generators.len(), 3);
        assert_eq!(engine.sinks.len(), 3);

        let generator = &engine.generators[1];
        assert_eq!(generator.source_node, 1);
        assert_eq!(generator.dest_node, 3);
        assert_eq!(generator.dest_port, 9001);
        assert_eq!(generator.rate_label, "2Mbps");
        assert_eq!(generator.packet_size, 1024);
        assert_eq!((generator.start_secs, generator.stop_secs), (1.0, 150.0));

        let sink = &engine.sinks[1];
        assert_eq!((sink.node, sink.port), (3, 9001));
        assert_eq!(plan.active_window(), (1.0, 150.0));
    }
}
