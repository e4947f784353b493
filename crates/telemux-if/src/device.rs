// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Inventory entry for one enumerable device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: u32,
    pub uuid: String,
    pub device_name: String,
    /// PCI device id, e.g. "0x56c0".
    pub pci_device_id: String,
    pub vendor_name: String,
    /// PCI bus address, e.g. "0000:4d:00.0". Also the attribution lookup key.
    pub pci_bdf_address: String,
    /// Full path of the driver device node, if the device has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm_device: Option<String>,
}

impl DeviceInfo {
    /// Short name of the driver device node ("/dev/dri/card0" -> "card0").
    pub fn dev_file(&self) -> Option<&str> {
        self.drm_device
            .as_deref()
            .and_then(|path| path.rsplit('/').next())
    }
}

/// Group ids with this bit set denote built-in card groups; only those are
/// valid card-level aggregation targets.
pub const CARD_GROUP_FLAG: u32 = 0x8000_0000;

/// A device group from the core's inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: u32,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub device_ids: Vec<u32>,
}

impl GroupInfo {
    pub fn is_card_group(&self) -> bool {
        self.group_id & CARD_GROUP_FLAG != 0
    }
}
