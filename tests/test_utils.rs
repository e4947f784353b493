// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common utilities for telemux tests
//!
//! Provides an in-memory device core and attribution source so the
//! exporter can be driven end to end without a fleet daemon. Statistics
//! are behind a mutex so tests can change the reported values between
//! scrapes and watch the counter handling.

use std::collections::HashMap;
use std::sync::Mutex;

use telemux::interface::{
    Attribution, AttributionSource, CoreError, DeviceCore, DeviceInfo, DeviceStats, EngineStats,
    FabricLink, GroupInfo, Sample, SampleField, TopologyLink,
};

pub struct FakeCore {
    pub devices: Vec<DeviceInfo>,
    pub groups: Vec<GroupInfo>,
    pub stats: Mutex<HashMap<u32, DeviceStats>>,
    pub engine_stats: Mutex<HashMap<u32, EngineStats>>,
    pub fabric: Mutex<HashMap<u32, Vec<FabricLink>>>,
}

#[allow(dead_code)]
impl FakeCore {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            groups: Vec::new(),
            stats: Mutex::new(HashMap::new()),
            engine_stats: Mutex::new(HashMap::new()),
            fabric: Mutex::new(HashMap::new()),
        }
    }

    pub fn device(device_id: u32) -> DeviceInfo {
        DeviceInfo {
            device_id,
            uuid: format!("00000000-0000-0000-0000-00000000000{device_id}"),
            device_name: format!("Accelerator {device_id}"),
            pci_device_id: "0x401e".to_string(),
            vendor_name: "Tenstorrent".to_string(),
            pci_bdf_address: format!("0000:0{device_id}:00.0"),
            drm_device: Some(format!("/dev/dri/card{device_id}")),
        }
    }

    pub fn set_stats(&self, device_id: u32, stats: DeviceStats) {
        self.stats.lock().unwrap().insert(device_id, stats);
    }
}

impl DeviceCore for FakeCore {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CoreError> {
        Ok(self.devices.clone())
    }

    fn device_statistics(&self, device_id: u32) -> Result<DeviceStats, CoreError> {
        self.stats
            .lock()
            .unwrap()
            .get(&device_id)
            .cloned()
            .ok_or(CoreError::NoSuchDevice(device_id))
    }

    fn engine_statistics(&self, device_id: u32) -> Result<EngineStats, CoreError> {
        Ok(self
            .engine_stats
            .lock()
            .unwrap()
            .get(&device_id)
            .cloned()
            .unwrap_or_default())
    }

    fn fabric_statistics(&self, device_id: u32) -> Result<Vec<FabricLink>, CoreError> {
        Ok(self
            .fabric
            .lock()
            .unwrap()
            .get(&device_id)
            .cloned()
            .unwrap_or_default())
    }

    fn topology_links(&self) -> Result<Vec<TopologyLink>, CoreError> {
        Ok(Vec::new())
    }

    fn xelink_port_health(&self, _device_id: u32) -> Result<Vec<Sample>, CoreError> {
        Ok(Vec::new())
    }

    fn list_groups(&self) -> Result<Vec<GroupInfo>, CoreError> {
        Ok(self.groups.clone())
    }
}

/// Attribution backed by a plain map, keyed by PCI bus address.
pub struct MapAttribution(pub HashMap<String, Attribution>);

impl AttributionSource for MapAttribution {
    fn lookup(&self, bus_address: &str) -> Option<Attribution> {
        self.0.get(bus_address).cloned()
    }
}

/// Build a sample with one numeric field set.
#[allow(dead_code)]
pub fn sample(category: &str, field: SampleField, value: f64) -> Sample {
    let mut sample = Sample {
        category: category.to_string(),
        ..Default::default()
    };
    sample.set_field(field, value);
    sample
}
