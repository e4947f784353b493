// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    error::CoreError, DeviceInfo, DeviceStats, EngineStats, FabricLink, GroupInfo, Sample,
    TopologyLink,
};

/// The device-management core as seen by the exporter.
///
/// Implementations talk to the fleet daemon over whatever transport it
/// exposes; the exporter only ever holds a `&dyn DeviceCore`. Every call may
/// involve a network round trip and is allowed to fail independently — the
/// exporter skips the affected device rather than aborting the scrape, with
/// the single exception of `list_devices`.
pub trait DeviceCore: Send + Sync {
    /// Enumerate the devices currently visible to the core.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CoreError>;

    /// Device-level and per-tile statistics for the last sampling window,
    /// with counters reported as lifetime accumulated values.
    fn device_statistics(&self, device_id: u32) -> Result<DeviceStats, CoreError>;

    /// Per-engine utilization samples.
    fn engine_statistics(&self, device_id: u32) -> Result<EngineStats, CoreError>;

    /// Throughput of the fabric links attached to this device.
    fn fabric_statistics(&self, device_id: u32) -> Result<Vec<FabricLink>, CoreError>;

    /// The physical link topology of the whole fleet.
    fn topology_links(&self) -> Result<Vec<TopologyLink>, CoreError>;

    /// Health samples for this device's fabric ports.
    fn xelink_port_health(&self, device_id: u32) -> Result<Vec<Sample>, CoreError>;

    /// All device groups known to the core, built-in card groups included.
    fn list_groups(&self) -> Result<Vec<GroupInfo>, CoreError>;
}

/// Scheduler-assigned workload using a device, as reported by the external
/// attribution source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Maps a device's PCI bus address to the workload scheduled onto it.
/// A miss is normal (the device is simply unassigned) and never an error.
pub trait AttributionSource: Send + Sync {
    fn lookup(&self, bus_address: &str) -> Option<Attribution>;
}

/// Attribution source for deployments without a scheduler integration.
pub struct NoAttribution;

impl AttributionSource for NoAttribution {
    fn lookup(&self, _bus_address: &str) -> Option<Attribution> {
        None
    }
}
