// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! File-level transcript reading.
//!
//! The pure record schema lives in `tether_core::transcript`; this module
//! reads transcript files from disk: incremental tails past a byte offset,
//! whole-file summaries, and backward scans for the current assistant tail.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tether_core::transcript::{
    last_assistant_entry, summarize_lines, AssistantTail, TranscriptSummary,
};

/// Read complete lines appended after `offset`, returning them together
/// with the new offset. An incomplete trailing line (no newline yet — the
/// agent may be mid-write) is held back and re-read on the next call, so a
/// byte range is never consumed twice.
pub fn read_new_lines(path: &Path, offset: u64) -> (Vec<String>, u64) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return (Vec::new(), offset),
    };

    let mut reader = BufReader::new(file);
    if reader.seek(SeekFrom::Start(offset)).is_err() {
        return (Vec::new(), offset);
    }

    let mut lines = Vec::new();
    let mut current_offset = offset;
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if !line.ends_with('\n') {
                    break;
                }
                current_offset += n as u64;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
        }
    }

    (lines, current_offset)
}

/// Summarize a whole transcript file. Missing or unreadable files yield an
/// empty summary.
pub fn summarize_file(path: &Path) -> TranscriptSummary {
    match read_all_lines(path) {
        Some(lines) => summarize_lines(lines.iter().map(String::as_str)),
        None => TranscriptSummary::default(),
    }
}

/// Scan a transcript backwards from EOF for the current assistant tail,
/// stopping at the first `user` record.
pub fn assistant_tail_of_file(path: &Path) -> AssistantTail {
    match read_all_lines(path) {
        Some(lines) => last_assistant_entry(lines.iter().rev().map(String::as_str)),
        None => AssistantTail::default(),
    }
}

/// The `command` input of the last tool call in a transcript, used as a
/// human-readable preview for permission prompts.
pub fn last_tool_command(path: &Path) -> Option<String> {
    let summary = summarize_file(path);
    summary
        .tool_calls
        .last()
        .and_then(|call| call.input.get("command").and_then(|c| c.as_str()).map(String::from))
}

fn read_all_lines(path: &Path) -> Option<Vec<String>> {
    let mut contents = String::new();
    File::open(path)
        .ok()?
        .read_to_string(&mut contents)
        .ok()?;
    Some(contents.lines().map(String::from).collect())
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
