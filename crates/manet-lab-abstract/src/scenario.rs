use crate::config::ScenarioConfig;
use crate::error::LabError;
use crate::protocol::RoutingProtocol;
use serde::Deserialize;

/// Partial scenario parameters, as read from a TOML scenario file or the
/// command line. Keys follow the harness option names (`nWifis`, `simTime`, ...).
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverride {
    pub protocol: Option<String>,
    pub n_wifis: Option<u32>,
    pub n_flows: Option<u32>,
    pub packet_size: Option<u32>,
    pub sim_time: Option<f64>,
    pub data_rate: Option<f64>,
}

impl ConfigOverride {
    /// Layer `higher` on top of `self`; values set in `higher` win.
    pub fn merge(self, higher: ConfigOverride) -> ConfigOverride {
        ConfigOverride {
            protocol: higher.protocol.or(self.protocol),
            n_wifis: higher.n_wifis.or(self.n_wifis),
            n_flows: higher.n_flows.or(self.n_flows),
            packet_size: higher.packet_size.or(self.packet_size),
            sim_time: higher.sim_time.or(self.sim_time),
            data_rate: higher.data_rate.or(self.data_rate),
        }
    }

    /// Apply the overrides to the documented defaults and validate the result.
    pub fn resolve(&self) -> Result<ScenarioConfig, LabError> {
        let defaults = ScenarioConfig::default();
        let protocol = match &self.protocol {
            Some(name) => name.parse::<RoutingProtocol>()?,
            None => defaults.protocol(),
        };

        ScenarioConfig::new(
            protocol,
            self.n_wifis.unwrap_or(defaults.node_count()),
            self.n_flows.unwrap_or(defaults.flow_count()),
            self.packet_size.unwrap_or(defaults.packet_size()),
            self.sim_time.unwrap_or(defaults.sim_duration()),
            self.data_rate.unwrap_or(defaults.data_rate_mbps()),
        )
    }
}
