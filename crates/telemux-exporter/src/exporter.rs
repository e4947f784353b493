// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! The scrape orchestrator.
//!
//! One [`Exporter`] owns all cross-scrape state: a registry of labelled
//! counter/gauge vectors per owner scope and the counter baselines. A
//! scrape walks the core's devices, rolls samples up, converts them into
//! the owners' registries and renders the tidied exposition. All state
//! sits behind one mutex; scrapes are seconds apart and the serialization
//! keeps concurrent collectors from corrupting counter baselines.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

use telemux_if::{
    AttributionSource, CoreError, DeviceCore, DeviceInfo, FabricLink, FabricLinkKind, Sample,
    TopologyLink,
};

use crate::catalog::{self, Metric};
use crate::counter::{CounterTracker, CounterUpdate};
use crate::format;
use crate::labels::{self, ComposedLabels, OwnerScope};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("failed to get devices: {0}")]
    DeviceList(#[source] CoreError),

    #[error("cannot get any devices")]
    NoDevices,

    #[error("metrics backend error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Liveness probe: healthy when at least one device is enumerable.
pub fn check_health(core: &dyn DeviceCore) -> Result<(), ScrapeError> {
    let devices = core.list_devices().map_err(ScrapeError::DeviceList)?;
    if devices.is_empty() {
        return Err(ScrapeError::NoDevices);
    }
    Ok(())
}

enum SeriesVec {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

/// The series registered so far for one owner scope.
struct OwnerSeries {
    registry: Registry,
    metrics: HashMap<&'static str, (SeriesVec, Vec<&'static str>)>,
}

impl Default for OwnerSeries {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            metrics: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct ExporterInner {
    owners: BTreeMap<OwnerScope, OwnerSeries>,
    counters: CounterTracker,
}

/// The metrics endpoint engine. Construct once per process and share; the
/// counter baselines inside are what keeps exposed counters non-decreasing
/// across scrapes.
pub struct Exporter {
    node_name: Option<String>,
    inner: Mutex<ExporterInner>,
}

impl Exporter {
    pub fn new(node_name: Option<String>) -> Self {
        Self {
            node_name,
            inner: Mutex::new(ExporterInner::default()),
        }
    }

    /// Run one scrape against the core and render the text exposition.
    ///
    /// Per-device failures drop that device's contribution; only a failed
    /// device list makes the whole scrape fail.
    pub fn scrape(
        &self,
        core: &dyn DeviceCore,
        attribution: &dyn AttributionSource,
    ) -> Result<String, ScrapeError> {
        let devices = core.list_devices().map_err(ScrapeError::DeviceList)?;

        let mut inner = self.inner.lock().unwrap();
        let mut resp = String::new();

        // Device and tile statistics, with tile data rolled up to device
        // level first. Device-level samples are kept around for the card
        // aggregation below.
        let mut all_device_samples: BTreeMap<u32, Vec<Sample>> = BTreeMap::new();
        for dev in &devices {
            let mut stats = match core.device_statistics(dev.device_id) {
                Ok(stats) => stats,
                Err(err) => {
                    tracing::warn!("skipping statistics of device {}: {err}", dev.device_id);
                    continue;
                }
            };
            crate::aggregate::aggregate_tile_to_device(&mut stats);
            all_device_samples.insert(dev.device_id, stats.device_level.clone());

            let owner = OwnerScope::device(dev.device_id);
            resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &stats.device_level)?);

            for tile in &stats.tile_level {
                let owner = OwnerScope::tile(dev.device_id, tile.tile_id);
                resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &tile.samples)?);
            }
        }

        // Card-level aggregation over the built-in card groups. A missing
        // group inventory is not fatal; device and tile data still renders.
        match core.list_groups() {
            Ok(groups) => {
                let cards = crate::aggregate::aggregate_device_to_card(&groups, &all_device_samples);
                for (card_id, samples) in cards {
                    let owner = OwnerScope::card(card_id);
                    resp.push_str(&self.convert(&mut inner, owner, None, attribution, &samples)?);
                }
            }
            Err(err) => tracing::warn!("skipping card aggregation, cannot get groups: {err}"),
        }

        // Per-engine utilization.
        for dev in &devices {
            let stats = match core.engine_statistics(dev.device_id) {
                Ok(stats) => stats,
                Err(err) => {
                    tracing::warn!("skipping engine statistics of device {}: {err}", dev.device_id);
                    continue;
                }
            };
            let owner = OwnerScope::device(dev.device_id);
            resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &stats.device_level)?);
            for tile in &stats.tile_level {
                let owner = OwnerScope::tile(dev.device_id, tile.tile_id);
                resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &tile.samples)?);
            }
        }

        // Fabric link throughput.
        for dev in &devices {
            let links = match core.fabric_statistics(dev.device_id) {
                Ok(links) => links,
                Err(err) => {
                    tracing::warn!("skipping fabric statistics of device {}: {err}", dev.device_id);
                    continue;
                }
            };
            let samples = fabric_samples(dev.device_id, &links, &devices);
            let owner = OwnerScope::device(dev.device_id);
            resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &samples)?);
        }

        // Topology links and fabric port health have no exposition mapping
        // yet; they flow through conversion and are dropped by the catalog.
        match core.topology_links() {
            Ok(links) => {
                for dev in &devices {
                    let samples: Vec<Sample> = links
                        .iter()
                        .filter(|link| link.local_device == dev.device_id)
                        .map(topology_sample)
                        .collect();
                    let owner = OwnerScope::device(dev.device_id);
                    resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &samples)?);
                }
            }
            Err(err) => tracing::warn!("skipping topology links: {err}"),
        }

        for dev in &devices {
            let samples = match core.xelink_port_health(dev.device_id) {
                Ok(samples) => samples,
                Err(err) => {
                    tracing::warn!("skipping port health of device {}: {err}", dev.device_id);
                    continue;
                }
            };
            let owner = OwnerScope::device(dev.device_id);
            resp.push_str(&self.convert(&mut inner, owner, Some(dev), attribution, &samples)?);
        }

        Ok(format::tidy(&resp))
    }

    /// Convert one owner's samples into its registry and return the owner's
    /// current exposition. Owners touched more than once per scrape repeat
    /// their lines; the tidy pass collapses them.
    fn convert(
        &self,
        inner: &mut ExporterInner,
        owner: OwnerScope,
        device: Option<&DeviceInfo>,
        attribution: &dyn AttributionSource,
        samples: &[Sample],
    ) -> Result<String, ScrapeError> {
        let attribution = device.and_then(|dev| attribution.lookup(&dev.pci_bdf_address));

        let ExporterInner { owners, counters } = inner;
        let series = owners.entry(owner.clone()).or_default();

        for sample in samples {
            for metric in catalog::resolve(&sample.category) {
                let Some(raw) = sample.field(metric.field) else {
                    continue;
                };
                let value = raw * metric.scale;
                let composed = labels::compose(
                    &owner,
                    device,
                    self.node_name.as_deref(),
                    attribution.as_ref(),
                    metric,
                    sample,
                );
                apply_sample(series, counters, metric, composed, value)?;
            }
        }

        let mut buf = Vec::new();
        TextEncoder::new().encode(&series.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Write one converted value into the owner's registry, creating the metric
/// vec on first sight and running counters through the tracker.
fn apply_sample(
    series: &mut OwnerSeries,
    counters: &mut CounterTracker,
    metric: &Metric,
    composed: ComposedLabels,
    value: f64,
) -> Result<(), ScrapeError> {
    let ComposedLabels { names, values, key } = composed;

    if !series.metrics.contains_key(metric.name) {
        let opts = Opts::new(metric.name, metric.help);
        let vec = if metric.is_counter {
            let vec = CounterVec::new(opts, &names)?;
            series.registry.register(Box::new(vec.clone()))?;
            SeriesVec::Counter(vec)
        } else {
            let vec = GaugeVec::new(opts, &names)?;
            series.registry.register(Box::new(vec.clone()))?;
            SeriesVec::Gauge(vec)
        };
        series.metrics.insert(metric.name, (vec, names.clone()));
    }

    // The label name set of a metric is fixed when its vec is created. If
    // composition produced a different shape (say, attribution appeared for
    // an owner mid-run), drop the sample instead of failing the scrape.
    let (vec, label_names) = &series.metrics[metric.name];
    if label_names != &names {
        tracing::warn!(
            "label set of {} changed for owner {}, dropping sample",
            metric.name,
            key.owner
        );
        return Ok(());
    }

    let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();
    match vec {
        SeriesVec::Gauge(gauge) => {
            gauge.get_metric_with_label_values(&value_refs)?.set(value);
        }
        SeriesVec::Counter(counter) => match counters.observe(&key, metric.handle_wrap, value) {
            CounterUpdate::Initial(total) => {
                counter.get_metric_with_label_values(&value_refs)?.inc_by(total);
            }
            CounterUpdate::Increment(delta) => {
                counter.get_metric_with_label_values(&value_refs)?.inc_by(delta);
            }
            CounterUpdate::Reset(total) => {
                // drop the old child so the exposed total restarts at the
                // fresh baseline
                let _ = counter.remove_label_values(&value_refs);
                counter.get_metric_with_label_values(&value_refs)?.inc_by(total);
            }
            CounterUpdate::Suppressed => {}
        },
    }
    Ok(())
}

/// Turn this device's fabric links into samples. Transmit counters become
/// `fabric-throughput` with the destination device resolved from the
/// inventory; windowed rates keep flowing as `xelink-throughput` until they
/// get an exposition mapping.
fn fabric_samples(device_id: u32, links: &[FabricLink], devices: &[DeviceInfo]) -> Vec<Sample> {
    let mut samples = Vec::new();
    for link in links.iter().filter(|link| link.src_device == device_id) {
        match link.kind {
            FabricLinkKind::TransmittedCounter => {
                let Some(dst) = devices.iter().find(|d| d.device_id == link.dst_device) else {
                    tracing::warn!(
                        "cannot find information for fabric link destination device {}",
                        link.dst_device
                    );
                    continue;
                };
                samples.push(Sample {
                    category: "fabric-throughput".to_string(),
                    min: link.min,
                    avg: link.avg,
                    max: link.max,
                    acc: link.acc,
                    local_tile: Some(link.src_tile),
                    remote_tile: Some(link.dst_tile),
                    remote_bdf: Some(dst.pci_bdf_address.clone()),
                    remote_dev_file: dst.dev_file().map(str::to_string),
                    ..Default::default()
                });
            }
            FabricLinkKind::ReceivedRate | FabricLinkKind::TransmittedRate => {
                samples.push(Sample {
                    category: "xelink-throughput".to_string(),
                    min: link.min,
                    avg: link.avg,
                    max: link.max,
                    local_tile: Some(link.src_tile),
                    remote_tile: Some(link.dst_tile),
                    ..Default::default()
                });
            }
            FabricLinkKind::ReceivedCounter => {}
        }
    }
    samples
}

fn topology_sample(link: &TopologyLink) -> Sample {
    Sample {
        category: "topology-link".to_string(),
        value: link.lane_count.map(f64::from),
        ..Default::default()
    }
}
