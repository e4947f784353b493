// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

//! Final tidy pass over the concatenated per-owner expositions.
//!
//! Many owners share a series name, so the per-owner encodes repeat the
//! `# HELP`/`# TYPE` declarations and an owner touched twice in one scrape
//! repeats its data lines. The tidy pass keeps each declaration once in
//! first-seen order and each data line once, sorted, which also makes
//! repeated scrapes with unchanged state byte-identical.

use std::collections::HashSet;

pub fn tidy(raw: &str) -> String {
    let mut comments: Vec<&str> = Vec::new();
    let mut seen_comments: HashSet<&str> = HashSet::new();
    let mut data: Vec<&str> = Vec::new();
    let mut seen_data: HashSet<&str> = HashSet::new();

    for line in raw.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if seen_comments.insert(line) {
                comments.push(line);
            }
        } else if seen_data.insert(line) {
            data.push(line);
        }
    }

    data.sort_unstable();

    let mut out = String::with_capacity(raw.len());
    for line in comments.iter().chain(data.iter()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
