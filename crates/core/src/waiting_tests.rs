// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

use super::*;
use yare::parameterized;

fn tail(text: &str) -> AssistantTail {
    AssistantTail {
        text: Some(text.to_string()),
        ..AssistantTail::default()
    }
}

#[parameterized(
    paren_yn = { "Delete the branch? (y/n)", Some(WaitingKind::YesNo) },
    bracket_yn = { "Proceed? [y/N]", Some(WaitingKind::YesNo) },
    confirm = { "Please confirm? the rebase", Some(WaitingKind::YesNo) },
    press_enter = { "Press Enter to continue", Some(WaitingKind::Enter) },
    hit_enter = { "hit enter when ready", Some(WaitingKind::Enter) },
    question = { "Which database should this migration target?", Some(WaitingKind::Question) },
    short_question = { "Ready?", None },
    statement = { "Build finished.", None },
)]
fn classifies_tail_text(text: &str, expected: Option<WaitingKind>) {
    let classifier = WaitingClassifier::new();
    assert_eq!(classifier.classify(&tail(text)), expected);
}

#[test]
fn exit_plan_mode_wins_over_text_rules() {
    let classifier = WaitingClassifier::new();
    let tail = AssistantTail {
        text: Some("Here is the plan, shall we proceed? (y/n)".to_string()),
        has_exit_plan_mode: true,
        plan: Some("1. do x".to_string()),
    };
    assert_eq!(classifier.classify(&tail), Some(WaitingKind::MultipleChoice));
}

#[test]
fn empty_tail_is_not_waiting() {
    let classifier = WaitingClassifier::new();
    assert_eq!(classifier.classify(&AssistantTail::default()), None);
}

#[test]
fn plan_choices_are_four() {
    assert_eq!(PLAN_CHOICES.len(), 4);
}
