// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static table mapping raw telemetry categories to output series.
//!
//! A category may map to more than one series (core temperature yields both
//! an average and a maximum series). Categories without an entry are not
//! exposed; the core is free to emit quantities this layer does not support
//! yet and they are skipped during conversion.

use telemux_if::SampleField;

/// Where an extension label's value comes from.
#[derive(Clone, Copy, Debug)]
pub enum LabelSource {
    Literal(&'static str),
    EngineType,
    EngineId,
    LocalTile,
    RemoteDevFile,
    RemoteBdf,
    RemoteTile,
}

/// One output series descriptor.
#[derive(Clone, Copy, Debug)]
pub struct Metric {
    pub name: &'static str,
    pub help: &'static str,
    pub is_counter: bool,
    /// Counters only: a decreased reading is treated as a reset/wraparound
    /// and the exposed series restarts at the fresh baseline. Without this
    /// the observation is suppressed instead.
    pub handle_wrap: bool,
    /// Which raw sample field feeds the series.
    pub field: SampleField,
    /// Multiplier applied to the raw value before exposition.
    pub scale: f64,
    /// Extension labels appended after the owner/identity labels, in order.
    pub ext_labels: &'static [(&'static str, LabelSource)],
}

impl Metric {
    const fn gauge(name: &'static str, help: &'static str) -> Metric {
        Metric {
            name,
            help,
            is_counter: false,
            handle_wrap: false,
            field: SampleField::Avg,
            scale: 1.0,
            ext_labels: &[],
        }
    }

    const fn counter(name: &'static str, help: &'static str) -> Metric {
        Metric {
            name,
            help,
            is_counter: true,
            handle_wrap: true,
            field: SampleField::Acc,
            scale: 1.0,
            ext_labels: &[],
        }
    }

    const fn field(mut self, field: SampleField) -> Metric {
        self.field = field;
        self
    }

    const fn scale(mut self, scale: f64) -> Metric {
        self.scale = scale;
        self
    }

    const fn ext(mut self, ext_labels: &'static [(&'static str, LabelSource)]) -> Metric {
        self.ext_labels = ext_labels;
        self
    }

    /// A decrease on this counter is more likely a transient read error than
    /// a genuine reset; suppress it instead of restarting the series.
    const fn no_wrap(mut self) -> Metric {
        self.handle_wrap = false;
        self
    }
}

const ENGINE_RATIO: &[Metric] = &[Metric::gauge(
    "accel_engine_ratio",
    "Accelerator active time of the elapsed time (in %), per tile",
)
.scale(0.01)];

const GROUP_RATIO_HELP: &str = "Avg utilization of engine group (in %), per tile";

const ENGINE_GROUP_COMPUTE: &[Metric] = &[Metric::gauge("accel_engine_group_ratio", GROUP_RATIO_HELP)
    .scale(0.01)
    .ext(&[("type", LabelSource::Literal("compute"))])];
const ENGINE_GROUP_MEDIA: &[Metric] = &[Metric::gauge("accel_engine_group_ratio", GROUP_RATIO_HELP)
    .scale(0.01)
    .ext(&[("type", LabelSource::Literal("media"))])];
const ENGINE_GROUP_COPY: &[Metric] = &[Metric::gauge("accel_engine_group_ratio", GROUP_RATIO_HELP)
    .scale(0.01)
    .ext(&[("type", LabelSource::Literal("copy"))])];
const ENGINE_GROUP_RENDER: &[Metric] = &[Metric::gauge("accel_engine_group_ratio", GROUP_RATIO_HELP)
    .scale(0.01)
    .ext(&[("type", LabelSource::Literal("render"))])];
const ENGINE_GROUP_3D: &[Metric] = &[Metric::gauge("accel_engine_group_ratio", GROUP_RATIO_HELP)
    .scale(0.01)
    .ext(&[("type", LabelSource::Literal("3d"))])];

const EU_ACTIVE: &[Metric] = &[Metric::gauge(
    "accel_eu_active_ratio",
    "Execution unit array active (in %), the normalized sum of all cycles spent actively executing instructions, per tile",
)
.scale(0.01)];
const EU_STALL: &[Metric] = &[Metric::gauge(
    "accel_eu_stall_ratio",
    "Execution unit array stall (in %), the normalized sum of all cycles with at least one thread loaded but the unit stalled, per tile",
)
.scale(0.01)];
const EU_IDLE: &[Metric] = &[Metric::gauge(
    "accel_eu_idle_ratio",
    "Execution unit array idle (in %), the normalized sum of all cycles with no thread scheduled, per tile",
)
.scale(0.01)];

const POWER: &[Metric] = &[Metric::gauge(
    "accel_power_watts",
    "Avg accelerator power (in watts), per device and per card",
)];
const ENERGY: &[Metric] = &[Metric::counter(
    "accel_energy_joules",
    "Total accelerator energy consumption since boot (in joules), per device",
)
.scale(0.001)];

const TEMPERATURE_HELP: &str = "Avg accelerator temperature (in Celsius degree), per tile";
const MAX_TEMPERATURE_HELP: &str = "Max accelerator temperature (in Celsius degree), per tile";

const CORE_TEMPERATURE: &[Metric] = &[
    Metric::gauge("accel_temperature_celsius", TEMPERATURE_HELP)
        .ext(&[("location", LabelSource::Literal("gpu"))]),
    Metric::gauge("accel_max_temperature_celsius", MAX_TEMPERATURE_HELP)
        .field(SampleField::Max)
        .ext(&[("location", LabelSource::Literal("gpu"))]),
];
const MEMORY_TEMPERATURE: &[Metric] = &[
    Metric::gauge("accel_temperature_celsius", TEMPERATURE_HELP)
        .ext(&[("location", LabelSource::Literal("mem"))]),
    Metric::gauge("accel_max_temperature_celsius", MAX_TEMPERATURE_HELP)
        .field(SampleField::Max)
        .ext(&[("location", LabelSource::Literal("mem"))]),
];

const FREQUENCY_HELP: &str = "Avg clock frequency (in MHz), per tile";

const FREQUENCY: &[Metric] = &[Metric::gauge("accel_frequency_mhz", FREQUENCY_HELP).ext(&[
    ("location", LabelSource::Literal("gpu")),
    ("type", LabelSource::Literal("actual")),
])];
const REQUEST_FREQUENCY: &[Metric] = &[Metric::gauge("accel_frequency_mhz", FREQUENCY_HELP).ext(&[
    ("location", LabelSource::Literal("gpu")),
    ("type", LabelSource::Literal("request")),
])];

const MEMORY_USED: &[Metric] = &[Metric::gauge(
    "accel_memory_used_bytes",
    "Used device memory (in bytes), per tile",
)];
const MEMORY_RATIO: &[Metric] = &[Metric::gauge(
    "accel_memory_ratio",
    "Used device memory / total device memory (in %), per tile",
)
.scale(0.01)];
const MEMORY_BANDWIDTH: &[Metric] = &[Metric::gauge(
    "accel_memory_bandwidth_ratio",
    "Avg memory throughput / max memory bandwidth (in %), per tile",
)
.scale(0.01)];
const MEMORY_READ: &[Metric] = &[Metric::counter(
    "accel_memory_read_bytes",
    "Total memory read bytes (in bytes), per tile",
)];
const MEMORY_WRITE: &[Metric] = &[Metric::counter(
    "accel_memory_write_bytes",
    "Total memory write bytes (in bytes), per tile",
)];

const RESETS: &[Metric] = &[Metric::counter(
    "accel_resets",
    "Total number of device resets since driver init, per device",
)
.no_wrap()];
const PROGRAMMING_ERRORS: &[Metric] = &[Metric::counter(
    "accel_programming_errors",
    "Total number of programming errors since driver init, per device",
)
.no_wrap()];
const DRIVER_ERRORS: &[Metric] = &[Metric::counter(
    "accel_driver_errors",
    "Total number of driver errors since driver init, per device",
)
.no_wrap()];

const CACHE_ERRORS_HELP: &str = "Total number of cache errors since driver init, per device";
const NON_COMPUTE_ERRORS_HELP: &str =
    "Total number of non-compute errors since driver init, per device";

const CACHE_ERRORS_CORRECTABLE: &[Metric] = &[Metric::counter("accel_cache_errors", CACHE_ERRORS_HELP)
    .no_wrap()
    .ext(&[("type", LabelSource::Literal("correctable"))])];
const CACHE_ERRORS_UNCORRECTABLE: &[Metric] = &[Metric::counter("accel_cache_errors", CACHE_ERRORS_HELP)
    .no_wrap()
    .ext(&[("type", LabelSource::Literal("uncorrectable"))])];
const NON_COMPUTE_ERRORS_CORRECTABLE: &[Metric] =
    &[Metric::counter("accel_non_compute_errors", NON_COMPUTE_ERRORS_HELP)
        .no_wrap()
        .ext(&[("type", LabelSource::Literal("correctable"))])];
const NON_COMPUTE_ERRORS_UNCORRECTABLE: &[Metric] =
    &[Metric::counter("accel_non_compute_errors", NON_COMPUTE_ERRORS_HELP)
        .no_wrap()
        .ext(&[("type", LabelSource::Literal("uncorrectable"))])];

const PCIE_READ: &[Metric] = &[Metric::counter(
    "accel_pcie_read_bytes",
    "Total PCIe read bytes (in bytes), per device",
)];
const PCIE_WRITE: &[Metric] = &[Metric::counter(
    "accel_pcie_write_bytes",
    "Total PCIe write bytes (in bytes), per device",
)];

const PER_ENGINE_RATIO: &[Metric] = &[Metric::gauge(
    "accel_per_engine_ratio",
    "Per-engine utilization (in %)",
)
.scale(0.01)
.ext(&[
    ("type", LabelSource::EngineType),
    ("engine_id", LabelSource::EngineId),
])];

const FABRIC_TX: &[Metric] = &[Metric::counter(
    "accel_fabric_tx_bytes",
    "Data transmitted through fabric link (in bytes)",
)
.ext(&[
    ("sub_dev", LabelSource::LocalTile),
    ("dst_dev_file", LabelSource::RemoteDevFile),
    ("dst_pci_bdf", LabelSource::RemoteBdf),
    ("dst_sub_dev", LabelSource::RemoteTile),
])];

/// Look up the output series for a raw category. Unknown categories resolve
/// to an empty slice and are skipped by the caller.
pub fn resolve(category: &str) -> &'static [Metric] {
    match category {
        "gpu-utilization" => ENGINE_RATIO,
        "engine-group-compute-utilization" => ENGINE_GROUP_COMPUTE,
        "engine-group-media-utilization" => ENGINE_GROUP_MEDIA,
        "engine-group-copy-utilization" => ENGINE_GROUP_COPY,
        "engine-group-render-utilization" => ENGINE_GROUP_RENDER,
        "engine-group-3d-utilization" => ENGINE_GROUP_3D,

        "eu-active" => EU_ACTIVE,
        "eu-stall" => EU_STALL,
        "eu-idle" => EU_IDLE,

        "power" => POWER,
        "energy" => ENERGY,
        "gpu-core-temperature" => CORE_TEMPERATURE,
        "memory-temperature" => MEMORY_TEMPERATURE,

        "gpu-frequency" => FREQUENCY,
        "gpu-request-frequency" => REQUEST_FREQUENCY,

        "memory-used" => MEMORY_USED,
        "memory-utilization" => MEMORY_RATIO,
        "memory-bandwidth" => MEMORY_BANDWIDTH,
        "memory-read" => MEMORY_READ,
        "memory-write" => MEMORY_WRITE,

        "resets" => RESETS,
        "programming-errors" => PROGRAMMING_ERRORS,
        "driver-errors" => DRIVER_ERRORS,
        "cache-errors-correctable" => CACHE_ERRORS_CORRECTABLE,
        "cache-errors-uncorrectable" => CACHE_ERRORS_UNCORRECTABLE,
        "non-compute-errors-correctable" => NON_COMPUTE_ERRORS_CORRECTABLE,
        "non-compute-errors-uncorrectable" => NON_COMPUTE_ERRORS_UNCORRECTABLE,

        "pcie-read" => PCIE_READ,
        "pcie-write" => PCIE_WRITE,

        "engine-utilization" => PER_ENGINE_RATIO,
        "fabric-throughput" => FABRIC_TX,

        _ => &[],
    }
}
