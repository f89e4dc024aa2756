// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Transcript record schema and pure parsing.
//!
//! The agent writes its conversation as newline-delimited JSON. Parsing is
//! total: malformed lines and unknown record or block kinds degrade to
//! `None` / `Unknown` / `Other` instead of propagating errors, so a torn
//! write never poisons an observation pass.

use serde::Deserialize;

/// Tool name the agent uses when it is awaiting plan-approval input.
pub const EXIT_PLAN_MODE: &str = "ExitPlanMode";

/// Tool name whose `file_path` input is how images enter the transcript.
pub const WRITE_TOOL: &str = "Write";

/// Maximum length of a message preview, in characters.
pub const MESSAGE_PREVIEW_LEN: usize = 200;

/// One newline-delimited record of the agent's transcript.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TranscriptRecord {
    #[serde(rename = "assistant")]
    Assistant {
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        message: AssistantMessage,
    },
    /// A user record marks a turn boundary when scanning backwards.
    #[serde(rename = "user")]
    User {},
    #[serde(rename = "system")]
    System {},
    /// Appended by the agent's stop hook; the authoritative turn-over signal.
    #[serde(rename = "result")]
    TurnResult {},
    /// Metadata-only record; the first thing a fresh post-clear session holds.
    #[serde(rename = "file-history-snapshot")]
    FileHistorySnapshot {},
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Tagged content block of an assistant message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// Parse one transcript line. Empty and malformed lines yield `None`.
pub fn parse_record(line: &str) -> Option<TranscriptRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// Collapse newlines and truncate to [`MESSAGE_PREVIEW_LEN`] characters.
pub fn preview(text: &str) -> String {
    text.replace('\n', " ")
        .chars()
        .take(MESSAGE_PREVIEW_LEN)
        .collect()
}

/// A tool invocation recorded in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub input: serde_json::Value,
}

/// Forward read of a transcript: cwd, messages, and tool calls.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSummary {
    /// First non-empty `cwd` seen on an assistant record.
    pub cwd: Option<String>,
    /// Most recent assistant text block, preview-truncated.
    pub last_message: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub all_messages: Vec<String>,
}

/// Summarize transcript lines in file order. Only assistant records
/// contribute; everything unparseable is skipped.
pub fn summarize_lines<'a, I>(lines: I) -> TranscriptSummary
where
    I: IntoIterator<Item = &'a str>,
{
    let mut summary = TranscriptSummary::default();
    for line in lines {
        let Some(TranscriptRecord::Assistant { cwd, message }) = parse_record(line) else {
            continue;
        };
        if summary.cwd.is_none() {
            summary.cwd = cwd.filter(|c| !c.is_empty());
        }
        for block in message.content {
            match block {
                ContentBlock::Text { text } => {
                    summary.last_message = Some(preview(&text));
                    summary.all_messages.push(text);
                }
                ContentBlock::ToolUse { name, input } => {
                    summary.tool_calls.push(ToolCall { name, input });
                }
                ContentBlock::Other => {}
            }
        }
    }
    summary
}

/// The tail of the current assistant turn, read backwards from EOF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTail {
    /// Latest assistant text block in the scanned window.
    pub text: Option<String>,
    /// A `tool_use` of [`EXIT_PLAN_MODE`] appeared in the scanned window.
    pub has_exit_plan_mode: bool,
    /// The plan text offered for approval, when present.
    pub plan: Option<String>,
}

/// Scan backwards across assistant records, stopping at the first `user`
/// record (a turn boundary). `lines_rev` must yield lines newest-first.
pub fn last_assistant_entry<'a, I>(lines_rev: I) -> AssistantTail
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tail = AssistantTail::default();
    for line in lines_rev {
        match parse_record(line) {
            Some(TranscriptRecord::User {}) => break,
            Some(TranscriptRecord::Assistant { message, .. }) => {
                // Within one record the latest block is the last one, so
                // walk the content in reverse as well.
                for block in message.content.iter().rev() {
                    match block {
                        ContentBlock::Text { text } if tail.text.is_none() => {
                            tail.text = Some(text.clone());
                        }
                        ContentBlock::ToolUse { name, input } if name == EXIT_PLAN_MODE => {
                            tail.has_exit_plan_mode = true;
                            if tail.plan.is_none() {
                                tail.plan = input
                                    .get("plan")
                                    .and_then(|p| p.as_str())
                                    .map(String::from);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => continue,
        }
    }
    tail
}

/// Media type for an image path, by extension.
pub fn image_media_type(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// The `file_path` of a `Write` tool call that targets an image file.
pub fn written_image_path(block: &ContentBlock) -> Option<String> {
    let ContentBlock::ToolUse { name, input } = block else {
        return None;
    };
    if name != WRITE_TOOL {
        return None;
    }
    let path = input.get("file_path").and_then(|p| p.as_str())?;
    image_media_type(path)?;
    Some(path.to_string())
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
