// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use std::io::Write;
use tempfile::TempDir;

fn temp_transcript(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.jsonl");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

fn append(path: &Path, content: &str) {
    let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
}

#[test]
fn read_new_lines_from_zero_reads_everything() {
    let (_dir, path) = temp_transcript("{\"type\":\"user\"}\n{\"type\":\"result\"}\n");
    let (lines, offset) = read_new_lines(&path, 0);
    assert_eq!(lines.len(), 2);
    assert_eq!(offset, std::fs::metadata(&path).unwrap().len());
}

#[test]
fn read_new_lines_skips_bytes_before_offset() {
    let (_dir, path) = temp_transcript("{\"type\":\"user\"}\n");
    let baseline = std::fs::metadata(&path).unwrap().len();
    append(&path, "{\"type\":\"result\"}\n");

    let (lines, _) = read_new_lines(&path, baseline);
    assert_eq!(lines, vec!["{\"type\":\"result\"}"]);
}

#[test]
fn read_new_lines_holds_back_incomplete_tail() {
    let (_dir, path) = temp_transcript("{\"type\":\"user\"}\n{\"type\":\"res");
    let (lines, offset) = read_new_lines(&path, 0);
    assert_eq!(lines, vec!["{\"type\":\"user\"}"]);

    // Completing the line later re-reads only the held-back range.
    append(&path, "ult\"}\n");
    let (lines, _) = read_new_lines(&path, offset);
    assert_eq!(lines, vec!["{\"type\":\"result\"}"]);
}

#[test]
fn read_new_lines_on_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let (lines, offset) = read_new_lines(&dir.path().join("nope.jsonl"), 7);
    assert!(lines.is_empty());
    assert_eq!(offset, 7);
}

#[test]
fn summarize_file_reads_assistant_content() {
    let (_dir, path) = temp_transcript(concat!(
        r#"{"type":"assistant","cwd":"/tmp/p","message":{"content":[{"type":"text","text":"hi"}]}}"#,
        "\n",
        r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"cargo test"}}]}}"#,
        "\n",
    ));
    let summary = summarize_file(&path);
    assert_eq!(summary.cwd.as_deref(), Some("/tmp/p"));
    assert_eq!(summary.last_message.as_deref(), Some("hi"));
    assert_eq!(summary.tool_calls.len(), 1);
}

#[test]
fn summarize_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let summary = summarize_file(&dir.path().join("nope.jsonl"));
    assert!(summary.last_message.is_none());
    assert!(summary.tool_calls.is_empty());
}

#[test]
fn assistant_tail_scans_backwards() {
    let (_dir, path) = temp_transcript(concat!(
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"old"}]}}"#,
        "\n",
        r#"{"type":"user","message":{"content":"next"}}"#,
        "\n",
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"new"}]}}"#,
        "\n",
    ));
    let tail = assistant_tail_of_file(&path);
    assert_eq!(tail.text.as_deref(), Some("new"));
}

#[test]
fn last_tool_command_previews_bash_input() {
    let (_dir, path) = temp_transcript(concat!(
        r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash","input":{"command":"rm -rf /tmp/test"}}]}}"#,
        "\n",
    ));
    assert_eq!(last_tool_command(&path).as_deref(), Some("rm -rf /tmp/test"));
}

#[test]
fn last_tool_command_absent_without_command_input() {
    let (_dir, path) = temp_transcript(concat!(
        r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read","input":{"file_path":"/x"}}]}}"#,
        "\n",
    ));
    assert_eq!(last_tool_command(&path), None);
}
