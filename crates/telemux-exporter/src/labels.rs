// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Label composition for exposed series.
//!
//! The label tuple order is part of a series' identity: it must be
//! identical across scrapes for the same descriptor, otherwise the series
//! key drifts and counter tracking breaks. Everything here builds labels in
//! one fixed order and derives the key from it.

use std::fmt;

use telemux_if::{Attribution, DeviceInfo, Sample, SampleOrigin};

use crate::catalog::{LabelSource, Metric};

/// Value used for a dynamic extension label whose sample field is absent.
const NOT_APPLICABLE: &str = "n/a";

/// The aggregation level a series belongs to. The finest-grained non-null
/// identifier wins: a tile scope always carries its device, a card scope
/// carries neither.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerScope {
    pub card: Option<u32>,
    pub device: Option<u32>,
    pub tile: Option<u32>,
}

impl OwnerScope {
    pub fn device(device_id: u32) -> Self {
        Self {
            card: None,
            device: Some(device_id),
            tile: None,
        }
    }

    pub fn tile(device_id: u32, tile_id: u32) -> Self {
        Self {
            card: None,
            device: Some(device_id),
            tile: Some(tile_id),
        }
    }

    pub fn card(card_id: u32) -> Self {
        Self {
            card: Some(card_id),
            device: None,
            tile: None,
        }
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part(f: &mut fmt::Formatter<'_>, name: &str, id: Option<u32>) -> fmt::Result {
            match id {
                Some(id) => write!(f, "{name}:{id}"),
                None => write!(f, "{name}:-"),
            }
        }
        part(f, "card", self.card)?;
        f.write_str("/")?;
        part(f, "dev", self.device)?;
        f.write_str("/")?;
        part(f, "tile", self.tile)
    }
}

/// Uniquely identifies one exposed time series across scrapes.
///
/// Device-identity labels are constant per owner and attribution labels are
/// deliberately excluded, so a workload landing on or leaving a device does
/// not reset its counters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub owner: OwnerScope,
    pub name: &'static str,
    pub ext_values: Vec<String>,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        for value in &self.ext_values {
            write!(f, "/{value}")?;
        }
        Ok(())
    }
}

/// The composed label tuple for one sample, plus the series key derived
/// from it.
pub struct ComposedLabels {
    pub names: Vec<&'static str>,
    pub values: Vec<String>,
    pub key: SeriesKey,
}

/// Build the label tuple for one sample, in fixed order: device identity,
/// node, workload attribution, sub-device, card, the metric's extension
/// labels, and the trailing source label.
pub fn compose(
    owner: &OwnerScope,
    device: Option<&DeviceInfo>,
    node_name: Option<&str>,
    attribution: Option<&Attribution>,
    metric: &Metric,
    sample: &Sample,
) -> ComposedLabels {
    let mut names: Vec<&'static str> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(dev) = device {
        names.push("uuid");
        values.push(dev.uuid.clone());
        names.push("dev_name");
        values.push(dev.device_name.clone());
        names.push("pci_dev");
        values.push(dev.pci_device_id.clone());
        names.push("vendor");
        values.push(dev.vendor_name.clone());
        names.push("pci_bdf");
        values.push(dev.pci_bdf_address.clone());
        if let Some(dev_file) = dev.dev_file() {
            names.push("dev_file");
            values.push(dev_file.to_string());
        }
    }

    if let Some(node) = node_name {
        names.push("node");
        values.push(node.to_string());
    }

    if let Some(attribution) = attribution {
        if let Some(workload) = &attribution.workload {
            names.push("workload");
            values.push(workload.clone());
        }
        if let Some(namespace) = &attribution.namespace {
            names.push("workload_namespace");
            values.push(namespace.clone());
        }
        if let Some(container) = &attribution.container {
            names.push("workload_container");
            values.push(container.clone());
        }
    }

    if let Some(tile_id) = owner.tile {
        names.push("sub_dev");
        values.push(tile_id.to_string());
    }
    if let Some(card_id) = owner.card {
        names.push("card");
        values.push(card_id.to_string());
    }

    let mut ext_values = Vec::with_capacity(metric.ext_labels.len());
    for &(name, source) in metric.ext_labels {
        let value = resolve_source(source, sample);
        names.push(name);
        values.push(value.clone());
        ext_values.push(value);
    }

    names.push("src");
    values.push(match sample.origin {
        SampleOrigin::Direct => "direct".to_string(),
        SampleOrigin::Aggregated(func) => func.to_string(),
    });

    ComposedLabels {
        names,
        values,
        key: SeriesKey {
            owner: owner.clone(),
            name: metric.name,
            ext_values,
        },
    }
}

fn resolve_source(source: LabelSource, sample: &Sample) -> String {
    let missing = || NOT_APPLICABLE.to_string();
    match source {
        LabelSource::Literal(value) => value.to_string(),
        LabelSource::EngineType => sample.engine_type.clone().unwrap_or_else(missing),
        LabelSource::EngineId => sample.engine_id.map(|v| v.to_string()).unwrap_or_else(missing),
        LabelSource::LocalTile => sample.local_tile.map(|v| v.to_string()).unwrap_or_else(missing),
        LabelSource::RemoteDevFile => sample.remote_dev_file.clone().unwrap_or_else(missing),
        LabelSource::RemoteBdf => sample.remote_bdf.clone().unwrap_or_else(missing),
        LabelSource::RemoteTile => sample.remote_tile.map(|v| v.to_string()).unwrap_or_else(missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn device() -> DeviceInfo {
        DeviceInfo {
            device_id: 0,
            uuid: "01000185-1170-700c-0000-000000000000".to_string(),
            device_name: "Accelerator 0".to_string(),
            pci_device_id: "0x401e".to_string(),
            vendor_name: "Tenstorrent".to_string(),
            pci_bdf_address: "0000:01:00.0".to_string(),
            drm_device: Some("/dev/dri/card0".to_string()),
        }
    }

    #[test]
    fn device_labels_come_first_and_in_order() {
        let metric = &catalog::resolve("power")[0];
        let sample = Sample {
            category: "power".to_string(),
            avg: Some(50.0),
            ..Default::default()
        };

        let composed = compose(
            &OwnerScope::device(0),
            Some(&device()),
            None,
            None,
            metric,
            &sample,
        );
        assert_eq!(
            composed.names,
            vec!["uuid", "dev_name", "pci_dev", "vendor", "pci_bdf", "dev_file", "src"]
        );
        assert_eq!(composed.values.last().unwrap(), "direct");
    }

    #[test]
    fn card_series_omit_device_identity() {
        let metric = &catalog::resolve("power")[0];
        let sample = Sample {
            category: "power".to_string(),
            avg: Some(80.0),
            origin: SampleOrigin::Aggregated("sum"),
            ..Default::default()
        };

        let composed = compose(&OwnerScope::card(0x8000_0001), None, None, None, metric, &sample);
        assert_eq!(composed.names, vec!["card", "src"]);
        assert_eq!(composed.values, vec!["2147483649".to_string(), "sum".to_string()]);
    }

    #[test]
    fn tile_owner_adds_the_subdevice_label() {
        let metric = &catalog::resolve("gpu-utilization")[0];
        let sample = Sample {
            category: "gpu-utilization".to_string(),
            avg: Some(42.0),
            ..Default::default()
        };

        let composed = compose(
            &OwnerScope::tile(0, 1),
            Some(&device()),
            Some("node-7"),
            None,
            metric,
            &sample,
        );
        let sub_dev = composed.names.iter().position(|n| *n == "sub_dev").unwrap();
        assert_eq!(composed.values[sub_dev], "1");
        let node = composed.names.iter().position(|n| *n == "node").unwrap();
        assert_eq!(composed.values[node], "node-7");
    }

    #[test]
    fn attribution_labels_appear_only_when_present() {
        let metric = &catalog::resolve("power")[0];
        let sample = Sample {
            category: "power".to_string(),
            avg: Some(50.0),
            ..Default::default()
        };
        let attribution = Attribution {
            workload: Some("training-run-42".to_string()),
            namespace: Some("ml".to_string()),
            container: None,
        };

        let composed = compose(
            &OwnerScope::device(0),
            Some(&device()),
            None,
            Some(&attribution),
            metric,
            &sample,
        );
        assert!(composed.names.contains(&"workload"));
        assert!(composed.names.contains(&"workload_namespace"));
        assert!(!composed.names.contains(&"workload_container"));
    }

    #[test]
    fn dynamic_extension_labels_read_the_sample() {
        let metric = &catalog::resolve("engine-utilization")[0];
        let sample = Sample {
            category: "engine-utilization".to_string(),
            avg: Some(10.0),
            engine_type: Some("compute".to_string()),
            engine_id: Some(3),
            ..Default::default()
        };

        let composed = compose(
            &OwnerScope::device(0),
            Some(&device()),
            None,
            None,
            metric,
            &sample,
        );
        assert_eq!(composed.key.ext_values, vec!["compute".to_string(), "3".to_string()]);
    }

    #[test]
    fn missing_dynamic_fields_fall_back_to_na() {
        let metric = &catalog::resolve("engine-utilization")[0];
        let sample = Sample {
            category: "engine-utilization".to_string(),
            avg: Some(10.0),
            ..Default::default()
        };

        let composed = compose(
            &OwnerScope::device(0),
            Some(&device()),
            None,
            None,
            metric,
            &sample,
        );
        assert_eq!(composed.key.ext_values, vec!["n/a".to_string(), "n/a".to_string()]);
    }

    #[test]
    fn series_key_ignores_attribution() {
        let metric = &catalog::resolve("energy")[0];
        let sample = Sample {
            category: "energy".to_string(),
            acc: Some(1000.0),
            ..Default::default()
        };
        let attribution = Attribution {
            workload: Some("job-1".to_string()),
            ..Default::default()
        };

        let with = compose(
            &OwnerScope::device(0),
            Some(&device()),
            None,
            Some(&attribution),
            metric,
            &sample,
        );
        let without = compose(&OwnerScope::device(0), Some(&device()), None, None, metric, &sample);
        assert_eq!(with.key, without.key);
    }
}
