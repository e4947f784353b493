// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON snapshot implementation of the device-management boundary.
//!
//! Stands in for the fleet daemon in standalone runs and demos: the whole
//! inventory and the latest statistics window are read from one JSON file.
//! Every scrape replays the same data, which is exactly what the exporter's
//! determinism guarantees are easiest to observe against.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use telemux_if::{
    Attribution, AttributionSource, CoreError, DeviceCore, DeviceInfo, DeviceStats, EngineStats,
    FabricLink, GroupInfo, Sample, TopologyLink,
};

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    devices: Vec<DeviceInfo>,
    #[serde(default)]
    groups: Vec<GroupInfo>,
    #[serde(default)]
    device_stats: HashMap<u32, DeviceStats>,
    #[serde(default)]
    engine_stats: HashMap<u32, EngineStats>,
    #[serde(default)]
    fabric: HashMap<u32, Vec<FabricLink>>,
    #[serde(default)]
    topology: Vec<TopologyLink>,
    #[serde(default)]
    port_health: HashMap<u32, Vec<Sample>>,
}

pub struct SnapshotCore {
    snapshot: Snapshot,
}

impl SnapshotCore {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path)?;
        let snapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| CoreError::Unreachable(format!("invalid snapshot: {err}")))?;
        Ok(Self { snapshot })
    }
}

impl DeviceCore for SnapshotCore {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CoreError> {
        Ok(self.snapshot.devices.clone())
    }

    fn device_statistics(&self, device_id: u32) -> Result<DeviceStats, CoreError> {
        self.snapshot
            .device_stats
            .get(&device_id)
            .cloned()
            .ok_or(CoreError::NoSuchDevice(device_id))
    }

    fn engine_statistics(&self, device_id: u32) -> Result<EngineStats, CoreError> {
        Ok(self
            .snapshot
            .engine_stats
            .get(&device_id)
            .cloned()
            .unwrap_or_default())
    }

    fn fabric_statistics(&self, device_id: u32) -> Result<Vec<FabricLink>, CoreError> {
        Ok(self
            .snapshot
            .fabric
            .get(&device_id)
            .cloned()
            .unwrap_or_default())
    }

    fn topology_links(&self) -> Result<Vec<TopologyLink>, CoreError> {
        Ok(self.snapshot.topology.clone())
    }

    fn xelink_port_health(&self, device_id: u32) -> Result<Vec<Sample>, CoreError> {
        Ok(self
            .snapshot
            .port_health
            .get(&device_id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_groups(&self) -> Result<Vec<GroupInfo>, CoreError> {
        Ok(self.snapshot.groups.clone())
    }
}

/// Attribution from a static JSON map of PCI bus address to workload.
pub struct StaticAttribution {
    by_bdf: HashMap<String, Attribution>,
}

impl StaticAttribution {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path)?;
        let by_bdf = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| CoreError::Unreachable(format!("invalid attribution map: {err}")))?;
        Ok(Self { by_bdf })
    }
}

impl AttributionSource for StaticAttribution {
    fn lookup(&self, bus_address: &str) -> Option<Attribution> {
        self.by_bdf.get(bus_address).cloned()
    }
}
