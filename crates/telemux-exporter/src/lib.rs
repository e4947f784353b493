// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0
#![crate_type = "lib"]

pub use counter::{CounterTracker, CounterUpdate};
pub use exporter::{check_health, Exporter, ScrapeError};
pub use labels::{OwnerScope, SeriesKey};

/// Telemux-exporter turns the raw per-device/per-tile samples produced by a
/// [`DeviceCore`](telemux_if::DeviceCore) into a Prometheus text exposition:
/// tile samples roll up to device level and device samples to card level,
/// accumulated hardware counters become non-decreasing exposed counters, and
/// the rendered output is deterministic so that repeated scrapes with
/// unchanged state are byte-identical.

pub mod aggregate;
pub mod catalog;
mod counter;
mod exporter;
pub mod format;
pub mod labels;
