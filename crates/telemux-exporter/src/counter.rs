// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cross-scrape monotonicity tracking for accumulated hardware counters.
//!
//! Scraping collectors assume counters never decrease between scrapes, but
//! the hardware reports lifetime accumulated values that can reset on a
//! reboot, wrap around, or glitch on a bad read. The tracker converts each
//! accumulated reading into a safe increment, or decides the observation
//! has to be dropped.

use std::collections::HashMap;

use crate::labels::SeriesKey;

/// What the exporter should do with one accumulated reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CounterUpdate {
    /// First observation of this series; expose the full current total once.
    Initial(f64),
    /// Normal monotonic progression; add the delta to the exposed total.
    Increment(f64),
    /// Reset or wraparound; restart the exposed series at the fresh
    /// baseline. The true lifetime total is lost but the series never
    /// decreases.
    Reset(f64),
    /// Decrease on a series without wraparound handling; drop the
    /// observation and leave the baseline untouched.
    Suppressed,
}

/// Last-seen accumulated value per counter series.
///
/// State lives for the process lifetime; a restart starts every counter
/// from scratch.
#[derive(Default)]
pub struct CounterTracker {
    last_seen: HashMap<SeriesKey, f64>,
}

impl CounterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one accumulated reading for a counter series.
    ///
    /// The baseline only ever moves forward: a suppressed observation does
    /// not advance it, so a subsequent value still below the stale baseline
    /// is suppressed as well until the counter catches up.
    pub fn observe(&mut self, key: &SeriesKey, handle_wrap: bool, value: f64) -> CounterUpdate {
        match self.last_seen.get_mut(key) {
            None => {
                self.last_seen.insert(key.clone(), value);
                CounterUpdate::Initial(value)
            }
            Some(last) if value >= *last => {
                let delta = value - *last;
                *last = value;
                CounterUpdate::Increment(delta)
            }
            Some(last) if handle_wrap => {
                tracing::info!(
                    "counter wrapped, {key}: pre={last}, cur={value}, restarting series"
                );
                *last = value;
                CounterUpdate::Reset(value)
            }
            Some(last) => {
                tracing::warn!("counter decreased, {key}: pre={last}, cur={value}, ignoring it");
                CounterUpdate::Suppressed
            }
        }
    }
}
