// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Path and name encodings shared between the bridge and the agent.
//!
//! The agent materialises each session under a directory whose name is a
//! sanitised form of the session's cwd. The bridge has to produce the exact
//! same encoding to find transcripts, and reverse it to show project names.

use std::path::Path;

/// File names inside the bridge state directory.
pub const ATTACHED_FILE: &str = "attached";
pub const CONFIG_FILE: &str = "config.json";
pub const CHAT_ID_FILE: &str = "chat-id";
pub const POLISH_VOICE_OFF_FILE: &str = "polish-voice-off";
pub const IMAGES_DIR: &str = "images";
pub const LOG_FILE: &str = "daemon.log";

const PERMISSION_REQUEST_PREFIX: &str = "permission-request-";
const PERMISSION_REQUEST_SUFFIX: &str = ".json";
const PERMISSION_RESPONSE_PREFIX: &str = "permission-response-";

/// Encode a cwd into the agent's project directory name: every character
/// outside `[A-Za-z0-9_-]` becomes `-`, so `/` and `.` both map to `-` and
/// a leading `/` yields a leading `-`.
pub fn encode_cwd(cwd: &Path) -> String {
    cwd.to_string_lossy()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}

/// Best-effort project name from an encoded directory name: drop the leading
/// hyphen, treat each remaining `-` as a path separator, take the last
/// non-empty segment.
pub fn project_name_from_encoded(encoded: &str) -> String {
    encoded
        .trim_start_matches('-')
        .rsplit('-')
        .find(|segment| !segment.is_empty())
        .unwrap_or(encoded)
        .to_string()
}

/// Sanitise a project name into a multiplexer window name: non
/// alphanumeric/underscore/hyphen characters become `-`, truncated to at
/// most 30 characters without a dangling hyphen.
pub fn sanitize_window_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .take(30)
        .collect();
    sanitized.trim_end_matches('-').to_string()
}

/// File name for a permission request with the given id.
pub fn permission_request_file(request_id: &str) -> String {
    format!("{PERMISSION_REQUEST_PREFIX}{request_id}{PERMISSION_REQUEST_SUFFIX}")
}

/// File name for a permission response with the given id.
pub fn permission_response_file(request_id: &str) -> String {
    format!("{PERMISSION_RESPONSE_PREFIX}{request_id}")
}

/// If `file_name` is a permission request file, return its request id.
pub fn permission_request_id(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(PERMISSION_REQUEST_PREFIX)?
        .strip_suffix(PERMISSION_REQUEST_SUFFIX)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
