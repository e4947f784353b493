// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Selects one of the numeric fields of a [`Sample`].
///
/// Windowed metrics carry `min`/`avg`/`max`, monotonic counters carry `acc`
/// and instantaneous readings carry `value`; which field a consumer reads is
/// declared per metric, not guessed from the sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleField {
    Value,
    Min,
    Avg,
    Max,
    Acc,
}

/// How a sample came to exist at its reporting level.
///
/// Raw samples from the core are always `Direct`; the aggregation engine
/// tags the samples it synthesizes with the name of the aggregation function
/// so they can be labelled apart downstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SampleOrigin {
    #[default]
    Direct,
    Aggregated(&'static str),
}

/// One raw telemetry reading.
///
/// The category string identifies the physical quantity ("power",
/// "gpu-utilization", ...). Categories the exposition layer does not know
/// are allowed here and are skipped during conversion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Sample {
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_tile: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dev_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_bdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_tile: Option<u32>,

    #[serde(skip)]
    pub origin: SampleOrigin,
}

impl Sample {
    pub fn field(&self, field: SampleField) -> Option<f64> {
        match field {
            SampleField::Value => self.value,
            SampleField::Min => self.min,
            SampleField::Avg => self.avg,
            SampleField::Max => self.max,
            SampleField::Acc => self.acc,
        }
    }

    pub fn set_field(&mut self, field: SampleField, value: f64) {
        match field {
            SampleField::Value => self.value = Some(value),
            SampleField::Min => self.min = Some(value),
            SampleField::Avg => self.avg = Some(value),
            SampleField::Max => self.max = Some(value),
            SampleField::Acc => self.acc = Some(value),
        }
    }
}

/// One scrape window of statistics for a device.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceStats {
    /// Start of the sampling window, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    /// End of the sampling window, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default)]
    pub device_level: Vec<Sample>,
    #[serde(default)]
    pub tile_level: Vec<TileStats>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileStats {
    pub tile_id: u32,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

/// Per-engine utilization, reported at device level and per tile.
/// Samples carry `engine_type`/`engine_id` and the `engine-utilization`
/// category.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineStats {
    #[serde(default)]
    pub device_level: Vec<Sample>,
    #[serde(default)]
    pub tile_level: Vec<TileStats>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FabricLinkKind {
    ReceivedRate,
    TransmittedRate,
    ReceivedCounter,
    TransmittedCounter,
}

/// Throughput of one fabric link between two tiles.
///
/// Counter kinds report lifetime byte totals in `acc`; rate kinds report a
/// windowed byte rate in `min`/`avg`/`max`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FabricLink {
    pub src_device: u32,
    pub src_tile: u32,
    pub dst_device: u32,
    pub dst_tile: u32,
    pub kind: FabricLinkKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc: Option<f64>,
}

/// One edge of the physical link topology.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopologyLink {
    pub local_device: u32,
    pub remote_device: u32,
    pub link_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_selection() {
        let mut sample = Sample {
            category: "power".to_string(),
            avg: Some(42.0),
            ..Default::default()
        };
        assert_eq!(sample.field(SampleField::Avg), Some(42.0));
        assert_eq!(sample.field(SampleField::Acc), None);

        sample.set_field(SampleField::Acc, 7.0);
        assert_eq!(sample.field(SampleField::Acc), Some(7.0));
    }

    #[test]
    fn raw_samples_deserialize_as_direct() {
        let sample: Sample =
            serde_json::from_str(r#"{"category": "energy", "acc": 1000.0}"#).unwrap();
        assert_eq!(sample.origin, SampleOrigin::Direct);
        assert_eq!(sample.acc, Some(1000.0));
    }
}
