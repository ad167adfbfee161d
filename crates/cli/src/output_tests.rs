// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::format_time_ago;

#[test]
fn zero_timestamp_renders_as_dash() {
    assert_eq!(format_time_ago(0), "-");
}

#[test]
fn negative_timestamp_renders_as_dash() {
    assert_eq!(format_time_ago(-1), "-");
}

#[test]
fn recent_timestamp_renders_as_seconds() {
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let result = format_time_ago(now_ms - 3_000);
    assert_eq!(result, "3s");
}
