// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0
#![crate_type = "lib"]

pub use telemux_exporter as exporter;
pub use telemux_if as interface;
