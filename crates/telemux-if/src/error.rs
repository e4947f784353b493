// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failures reported by a [`DeviceCore`](crate::DeviceCore) implementation.
///
/// The exporter treats these as per-call events: a failed device list aborts
/// the scrape, anything scoped to a single device only drops that device's
/// contribution.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("device management core is unreachable: {0}")]
    Unreachable(String),

    #[error("core call failed with status {status}: {message}")]
    CallFailed { status: i32, message: String },

    #[error("no such device: {0}")]
    NoSuchDevice(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
