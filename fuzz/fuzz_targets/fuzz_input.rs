// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    patterns: Vec<String>,
    folders: Vec<String>,
    reply: String,
}

fuzz_target!(|input: Input| {
    let result = notewise::filter(&input.folders, &input.patterns);
    assert_eq!(result.allowed.len() + result.ignored.len(), input.folders.len());

    let _ = notewise::llm::parse_proposal(&input.reply);
    let _ = notewise::tags::existing_tags(&input.reply);
});
