use serde::Serialize;

use crate::error::LabError;
use crate::protocol::RoutingProtocol;

/// Delay before traffic generators start, leaving time for routing to converge.
pub const WARM_UP_OFFSET_SECS: f64 = 1.0;

/// Validated parameters of a single comparison run.
///
/// Fields are private so every value in circulation has passed
/// [`ScenarioConfig::new`]; build one from a [`crate::ConfigOverride`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioConfig {
    protocol: RoutingProtocol,
    node_count: u32,
    flow_count: u32,
    packet_size: u32,
    sim_duration: f64,
    data_rate_mbps: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            protocol: RoutingProtocol::Aodv,
            node_count: 50,
            flow_count: 10,
            packet_size: 1024,
            sim_duration: 150.0,
            data_rate_mbps: 0.128,
        }
    }
}

impl ScenarioConfig {
    pub fn new(
        protocol: RoutingProtocol,
        node_count: u32,
        flow_count: u32,
        packet_size: u32,
        sim_duration: f64,
        data_rate_mbps: f64,
    ) -> Result<Self, LabError> {
        let config = Self {
            protocol,
            node_count,
            flow_count,
            packet_size,
            sim_duration,
            data_rate_mbps,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LabError> {
        for (name, value) in [
            ("nWifis", self.node_count),
            ("nFlows", self.flow_count),
            ("packetSize", self.packet_size),
        ] {
            if value == 0 {
                return Err(LabError::InvalidConfiguration(format!(
                    "{name} must be positive"
                )));
            }
        }

        for (name, value) in [
            ("simTime", self.sim_duration),
            ("dataRate", self.data_rate_mbps),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LabError::InvalidConfiguration(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        // Generators are configured in whole kbps below 1 Mbps
        if (self.data_rate_mbps * 1000.0).round() < 1.0 {
            return Err(LabError::InvalidConfiguration(format!(
                "dataRate ({} Mbps) is below the 1 kbps generator resolution",
                self.data_rate_mbps
            )));
        }

        if self.sim_duration <= WARM_UP_OFFSET_SECS {
            return Err(LabError::InvalidConfiguration(format!(
                "simTime ({}s) must exceed the {WARM_UP_OFFSET_SECS}s warm-up offset",
                self.sim_duration
            )));
        }

        Ok(())
    }

    pub fn protocol(&self) -> RoutingProtocol {
        self.protocol
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn flow_count(&self) -> u32 {
        self.flow_count
    }

    /// Payload size of each generated packet, in bytes.
    pub fn packet_size(&self) -> u32 {
        self.packet_size
    }

    /// Nominal run length in seconds, warm-up included.
    pub fn sim_duration(&self) -> f64 {
        self.sim_duration
    }

    /// Per-flow offered load in Mbps.
    pub fn data_rate_mbps(&self) -> f64 {
        self.data_rate_mbps
    }
}
