// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tile-to-device and device-to-card sample roll-up.
//!
//! Only categories listed in the explicit aggregator tables are rolled up;
//! everything else stays at the level it was reported at. Synthesized
//! samples are tagged with the aggregation function so the label composer
//! can tell them apart from direct readings.

use std::collections::{BTreeMap, BTreeSet};

use telemux_if::{DeviceStats, GroupInfo, Sample, SampleField, SampleOrigin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Avg,
}

impl AggFunc {
    pub fn name(self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
        }
    }

    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            AggFunc::Sum => values.iter().sum(),
            AggFunc::Avg => {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
        }
    }
}

type AggTable = &'static [(&'static str, &'static [(SampleField, AggFunc)])];

const SUM_AVG_FIELD: &[(SampleField, AggFunc)] = &[(SampleField::Avg, AggFunc::Sum)];
const AVG_AVG_FIELD: &[(SampleField, AggFunc)] = &[(SampleField::Avg, AggFunc::Avg)];
const SUM_ACC_FIELD: &[(SampleField, AggFunc)] = &[(SampleField::Acc, AggFunc::Sum)];

/// Categories rolled up from tile to device level.
pub const TILE_TO_DEVICE: AggTable = &[
    ("power", SUM_AVG_FIELD),
    ("resets", SUM_ACC_FIELD),
    ("programming-errors", SUM_ACC_FIELD),
    ("driver-errors", SUM_ACC_FIELD),
    ("cache-errors-correctable", SUM_ACC_FIELD),
    ("cache-errors-uncorrectable", SUM_ACC_FIELD),
    ("non-compute-errors-correctable", SUM_ACC_FIELD),
    ("non-compute-errors-uncorrectable", SUM_ACC_FIELD),
    ("memory-utilization", AVG_AVG_FIELD),
    ("memory-bandwidth", AVG_AVG_FIELD),
    ("gpu-utilization", AVG_AVG_FIELD),
];

/// Categories rolled up from device to card level.
pub const DEVICE_TO_CARD: AggTable = &[("power", SUM_AVG_FIELD)];

fn lookup(table: AggTable, category: &str) -> Option<&'static [(SampleField, AggFunc)]> {
    table
        .iter()
        .find(|(cat, _)| *cat == category)
        .map(|(_, fields)| *fields)
}

/// Aggregate one group of same-category samples into a single synthesized
/// sample, applying each declared aggregator to the samples that carry the
/// field. Returns `None` when none of the declared fields is present.
fn aggregate_group(
    category: &str,
    samples: &[&Sample],
    fields: &'static [(SampleField, AggFunc)],
) -> Option<Sample> {
    let mut out = Sample {
        category: category.to_string(),
        ..Default::default()
    };
    let mut applied = None;
    for (field, func) in fields {
        let values: Vec<f64> = samples.iter().filter_map(|s| s.field(*field)).collect();
        if values.is_empty() {
            continue;
        }
        out.set_field(*field, func.apply(&values));
        applied = Some(func.name());
    }
    out.origin = SampleOrigin::Aggregated(applied?);
    Some(out)
}

/// Roll tile samples up to device level, in place.
///
/// A category already reported at device level is never synthesized again,
/// so running this twice over the same stats is a no-op the second time and
/// tile data never double-counts into existing device data.
pub fn aggregate_tile_to_device(stats: &mut DeviceStats) {
    let synthesized = {
        let existing: BTreeSet<&str> = stats
            .device_level
            .iter()
            .map(|s| s.category.as_str())
            .collect();

        let mut by_category: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
        for tile in &stats.tile_level {
            for sample in &tile.samples {
                by_category
                    .entry(sample.category.as_str())
                    .or_default()
                    .push(sample);
            }
        }

        let mut synthesized = Vec::new();
        for (category, samples) in by_category {
            let Some(fields) = lookup(TILE_TO_DEVICE, category) else {
                continue;
            };
            if existing.contains(category) {
                continue;
            }
            if let Some(sample) = aggregate_group(category, &samples, fields) {
                synthesized.push(sample);
            }
        }
        synthesized
    };

    stats.device_level.extend(synthesized);
}

/// Roll device-level samples up to card level.
///
/// Membership comes from the built-in card groups only (group id carries the
/// marker bit); devices outside any card group contribute nothing here and
/// keep their device-level exposure untouched.
pub fn aggregate_device_to_card(
    groups: &[GroupInfo],
    all_device_samples: &BTreeMap<u32, Vec<Sample>>,
) -> BTreeMap<u32, Vec<Sample>> {
    let mut device_to_card: BTreeMap<u32, u32> = BTreeMap::new();
    for group in groups.iter().filter(|g| g.is_card_group()) {
        for device_id in &group.device_ids {
            // a device belongs to at most one card, no check here
            device_to_card.insert(*device_id, group.group_id);
        }
    }

    let mut grouped: BTreeMap<(u32, &str), Vec<&Sample>> = BTreeMap::new();
    for (device_id, samples) in all_device_samples {
        let Some(card_id) = device_to_card.get(device_id) else {
            continue;
        };
        for sample in samples {
            grouped
                .entry((*card_id, sample.category.as_str()))
                .or_default()
                .push(sample);
        }
    }

    let mut cards: BTreeMap<u32, Vec<Sample>> = BTreeMap::new();
    for ((card_id, category), samples) in grouped {
        let Some(fields) = lookup(DEVICE_TO_CARD, category) else {
            continue;
        };
        if let Some(sample) = aggregate_group(category, &samples, fields) {
            cards.entry(card_id).or_default().push(sample);
        }
    }
    cards
}
