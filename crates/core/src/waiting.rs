// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Classifier for "the agent is waiting on input" tails.
//!
//! Fed the assistant's last text block once a turn has gone quiet; a
//! classification drives a proactive notification so the operator is not
//! left staring at a silent chat while the agent sits on a prompt.

use crate::transcript::AssistantTail;
use regex::Regex;

/// The four fixed choices offered for a plan-approval prompt, in the order
/// the agent's own dialog numbers them.
pub const PLAN_CHOICES: [&str; 4] = [
    "Accept plan",
    "Accept, keep planning",
    "Reject plan",
    "Reject, keep planning",
];

/// What kind of input the agent appears to be waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitingKind {
    YesNo,
    Enter,
    Question,
    MultipleChoice,
}

/// Regex-based tail classifier. Patterns are compiled once at construction;
/// a pattern that fails to compile simply never matches.
#[derive(Debug, Clone)]
pub struct WaitingClassifier {
    yes_no: Option<Regex>,
    enter: Option<Regex>,
}

impl Default for WaitingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitingClassifier {
    pub fn new() -> Self {
        Self {
            yes_no: Regex::new(r"(?i)\(y/n\)|\[y/n\]|confirm\?").ok(),
            enter: Regex::new(r"(?i)press enter|hit enter").ok(),
        }
    }

    /// Classify an assistant tail. `None` means nothing worth interrupting
    /// the operator for.
    pub fn classify(&self, tail: &AssistantTail) -> Option<WaitingKind> {
        if tail.has_exit_plan_mode {
            return Some(WaitingKind::MultipleChoice);
        }
        let text = tail.text.as_deref()?.trim();
        if matches(&self.yes_no, text) {
            return Some(WaitingKind::YesNo);
        }
        if matches(&self.enter, text) {
            return Some(WaitingKind::Enter);
        }
        if text.ends_with('?') && text.chars().count() > 10 {
            return Some(WaitingKind::Question);
        }
        None
    }
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

#[cfg(test)]
#[path = "waiting_tests.rs"]
mod tests;
