// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::error::ErrorKind;

use super::{cli_command, find_subcommand};

#[test]
fn version_short_lowercase_v() {
    let err = cli_command()
        .try_get_matches_from(["ew", "-v"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_short_uppercase_v() {
    let err = cli_command()
        .try_get_matches_from(["ew", "-V"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_long() {
    let err = cli_command()
        .try_get_matches_from(["ew", "--version"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn version_uppercase_v_hidden_in_help() {
    let mut buf = Vec::new();
    cli_command().write_help(&mut buf).unwrap();
    let help = String::from_utf8(buf).unwrap();
    assert!(help.contains("-v, --version"));
    assert!(!help.contains("-V,"));
}

#[test]
fn all_three_subcommands_are_registered() {
    let cmd = cli_command();
    let names: Vec<&str> = cmd.get_subcommands().map(|s| s.get_name()).collect();
    assert!(names.contains(&"status"));
    assert!(names.contains(&"sessions"));
    assert!(names.contains(&"show"));
}

#[test]
fn find_subcommand_locates_sessions() {
    let cmd = cli_command();
    let found = find_subcommand(cmd, &["sessions"]);
    assert_eq!(found.get_name(), "sessions");
}

#[test]
fn find_subcommand_falls_back_to_root_when_unknown() {
    let cmd = cli_command();
    let found = find_subcommand(cmd, &["nonexistent"]);
    assert_eq!(found.get_name(), "ew");
}

#[test]
fn show_requires_a_session_argument() {
    let err = cli_command()
        .try_get_matches_from(["ew", "show"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}
