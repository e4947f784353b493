// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0
#![crate_type = "lib"]

pub use device::{DeviceInfo, GroupInfo, CARD_GROUP_FLAG};
pub use error::CoreError;
pub use interface::{Attribution, AttributionSource, DeviceCore, NoAttribution};
pub use sample::{
    DeviceStats, EngineStats, FabricLink, FabricLinkKind, Sample, SampleField, SampleOrigin,
    TileStats, TopologyLink,
};

/// Telemux-if defines the boundary to the device-management core in a
/// transport agnostic way. The core enumerates devices and produces the raw
/// per-device and per-tile samples; everything here is data plus the two
/// traits (`DeviceCore`, `AttributionSource`) the exporter is driven by.

mod device;
pub mod error;
mod interface;
mod sample;
