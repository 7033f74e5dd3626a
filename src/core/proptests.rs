//! Property-based tests for the conversation session
//!
//! These tests drive a session with arbitrary operation sequences and check
//! the transcript and single-flight invariants after every step.

use super::*;
use crate::answering::AnswerError;
use crate::conversation::{Message, Sender};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Input(String),
    Submit,
    Answer(String),
    Fail,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop_oneof!["[a-zA-Z ?]{0,20}", "[ \t\n]{0,4}"].prop_map(Op::Input),
        Just(Op::Submit),
        "[a-zA-Z ]{0,20}".prop_map(Op::Answer),
        Just(Op::Fail),
    ]
}

fn snapshot(session: &ConversationSession) -> Vec<(Sender, String)> {
    session
        .transcript()
        .iter()
        .map(|m: &Message| (m.sender(), m.text().to_string()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Transcript only grows, and earlier entries never change
    #[test]
    fn prop_transcript_is_append_only(
        greeting in proptest::option::of("[a-zA-Z !]{1,20}"),
        ops in proptest::collection::vec(arb_op(), 0..40),
    ) {
        let mut session = ConversationSession::new(SessionOptions { greeting });
        let mut before = snapshot(&session);

        for op in ops {
            match op {
                Op::Input(text) => session.update_input(text),
                Op::Submit => { session.submit(); }
                Op::Answer(text) => { session.on_answer_received(text); }
                Op::Fail => { session.on_answer_failed(&AnswerError::Timeout); }
            }

            let after = snapshot(&session);
            prop_assert!(after.len() >= before.len());
            prop_assert_eq!(&after[..before.len()], &before[..]);
            before = after;
        }
    }

    // Submits are accepted only from Idle with non-blank input
    #[test]
    fn prop_submit_guards(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut session = ConversationSession::default();

        for op in ops {
            let len = session.transcript().len();
            match op {
                Op::Submit => {
                    let was_waiting = session.awaiting_response();
                    let pending = session.pending().to_string();
                    let state = session.state();

                    match session.submit() {
                        Some(question) => {
                            prop_assert!(!was_waiting);
                            prop_assert!(!pending.trim().is_empty());
                            prop_assert_eq!(&question, &pending);
                            prop_assert_eq!(session.pending(), "");
                            prop_assert!(session.awaiting_response());
                            prop_assert_eq!(session.transcript().len(), len + 1);
                        }
                        None => {
                            prop_assert!(was_waiting || pending.trim().is_empty());
                            prop_assert_eq!(session.pending(), pending.as_str());
                            prop_assert_eq!(session.state(), state);
                            prop_assert_eq!(session.transcript().len(), len);
                        }
                    }
                }
                Op::Input(text) => session.update_input(text),
                Op::Answer(text) => {
                    let was_waiting = session.awaiting_response();
                    prop_assert_eq!(session.on_answer_received(text), was_waiting);
                    prop_assert!(!session.awaiting_response());
                    prop_assert_eq!(session.transcript().len(), len + usize::from(was_waiting));
                }
                Op::Fail => {
                    let was_waiting = session.awaiting_response();
                    prop_assert_eq!(session.on_answer_failed(&AnswerError::Abandoned), was_waiting);
                    prop_assert!(!session.awaiting_response());
                    prop_assert_eq!(session.transcript().len(), len + usize::from(was_waiting));
                }
            }

            let view = session.view();
            prop_assert_eq!(view.input_enabled, !session.awaiting_response());
            let pending_entries = view
                .entries
                .iter()
                .filter(|e| matches!(e, ViewEntry::Pending { .. }))
                .count();
            prop_assert_eq!(pending_entries, usize::from(session.awaiting_response()));
            prop_assert_eq!(view.entries.len(), session.transcript().len() + pending_entries);
        }
    }
}
