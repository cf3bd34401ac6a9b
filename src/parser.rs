// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

/// Splits one delimited line into trimmed fields.
///
/// A `"` flips the in-quotes state and is dropped; commas inside quotes are
/// kept as data. Doubled quotes are not an escape, so `"a""b"` reads as `ab`.
/// Malformed quoting never errors: an unterminated quote simply swallows the
/// rest of the line into the current field.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
