// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use std::path::PathBuf;
use yare::parameterized;

#[parameterized(
    root = { "/", "-" },
    simple = { "/tmp/proj", "-tmp-proj" },
    dotted = { "/home/u/my.app", "-home-u-my-app" },
    spaced = { "/home/u/my app", "-home-u-my-app" },
)]
fn encode_cwd_cases(cwd: &str, expected: &str) {
    assert_eq!(encode_cwd(&PathBuf::from(cwd)), expected);
}

#[test]
fn project_name_is_last_segment() {
    assert_eq!(project_name_from_encoded("-tmp-proj"), "proj");
    assert_eq!(project_name_from_encoded("-home-u-my-app"), "app");
}

#[test]
fn project_name_skips_trailing_separators() {
    assert_eq!(project_name_from_encoded("-tmp-proj-"), "proj");
}

#[test]
fn window_name_is_sanitized_and_bounded() {
    assert_eq!(sanitize_window_name("my cool proj"), "my-cool-proj");
    let long = "a".repeat(64);
    assert_eq!(sanitize_window_name(&long).len(), 30);
    assert_eq!(sanitize_window_name("abc."), "abc");
}

#[test]
fn permission_file_names_round_trip() {
    let name = permission_request_file("xyz");
    assert_eq!(name, "permission-request-xyz.json");
    assert_eq!(permission_request_id(&name), Some("xyz"));
    assert_eq!(permission_request_id("permission-request-.json"), None);
    assert_eq!(permission_request_id("other.json"), None);
    assert_eq!(permission_response_file("xyz"), "permission-response-xyz");
}

mod encoding_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Encoded names never contain a path separator or any character
        /// the agent would refuse in a directory name.
        #[test]
        fn encoded_cwd_is_directory_safe(cwd in "(/[a-zA-Z0-9 ._-]{1,12}){1,6}") {
            let encoded = encode_cwd(&PathBuf::from(&cwd));
            prop_assert!(encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            prop_assert_eq!(encoded.chars().count(), cwd.chars().count());
        }
    }
}
