//! Pure resolution engine.
//!
//! `resolve` maps (current state, inbound event) to a next state and a
//! directive. It performs no I/O: the dispatcher applies the state change
//! to the session store and executes the directive against the services.

use confide_db::entities::vote::VoteValue;

use crate::codec::{self, CallbackAction, ShareKind};

use super::{ConversationState, ProfileField};

/// An inbound event, normalized by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Free-form message text (never starting with `/`).
    Text(String),
    /// A `/command`, with the optional payload after the first space.
    Command {
        name: String,
        payload: Option<String>,
    },
    /// A decoded button press.
    Action(CallbackAction),
}

/// What happens to the user's conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Leave the state as it is.
    Keep,
    /// Drop the state.
    Clear,
    /// Replace the state.
    Set(ConversationState),
}

/// Moderator-facing directives, dispatched only from the admin group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationDirective {
    Approve { submission_id: i64 },
    Reject { submission_id: i64 },
    DeleteComment { comment_id: i64, submission_id: i64 },
    DismissReports { comment_id: i64 },
}

/// What the dispatcher should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Present the terms with accept/decline buttons.
    ShowTerms,
    /// Record consent, then ask what the user is sharing.
    TermsAccepted,
    /// End the flow; the user declined.
    TermsDeclined,
    /// Ask what the user is sharing (terms already accepted).
    AskShareType,
    /// Prompt for the confession body.
    PromptSubmission { kind: ShareKind },
    /// Create a submission and send it for review.
    CreateSubmission { text: String },
    /// Prompt for a comment body.
    PromptComment { submission_id: i64 },
    /// Prompt for a reply body.
    PromptReply { submission_id: i64, parent_id: i64 },
    /// Create a comment (or reply, when `parent_id` is set).
    CreateComment {
        submission_id: i64,
        parent_id: Option<i64>,
        text: String,
    },
    /// Present the report-reason picker.
    AskReportReason { comment_id: i64, submission_id: i64 },
    /// File a report with the selected reason.
    FileReport {
        comment_id: i64,
        submission_id: i64,
        reason_index: usize,
    },
    /// Prompt for a new alias.
    PromptAlias,
    /// Store the new alias.
    SetAlias { value: String },
    /// Open a submission's comment hub (deep link target).
    OpenHub { submission_id: i64 },
    /// Render a page of comments.
    BrowsePage { submission_id: i64, page: u64 },
    /// Cast/toggle a vote and refresh the pressed keyboard.
    CastVote {
        comment_id: i64,
        value: VoteValue,
        submission_id: i64,
        page: u64,
    },
    /// Toggle following a submission.
    ToggleFollow { submission_id: i64 },
    /// A moderator action.
    Moderate(ModerationDirective),
    /// Show the idle top-level menu; no mutation.
    ShowMenu,
    /// Confirm cancellation of an in-progress flow.
    Cancelled,
    /// The command was not recognized.
    UnknownCommand,
    /// A deep link or input failed to decode; fail closed.
    InvalidInput,
    /// Acknowledge and do nothing.
    Noop,
}

/// The outcome of resolving one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: StateChange,
    pub directive: Directive,
}

impl Resolution {
    const fn new(state: StateChange, directive: Directive) -> Self {
        Self { state, directive }
    }
}

/// Resolve an inbound event against the user's current state.
///
/// `terms_accepted` is the persisted consent flag; it decides whether
/// `/start` re-presents the terms or jumps straight to the share-type
/// choice.
#[must_use]
pub fn resolve(
    current: Option<&ConversationState>,
    terms_accepted: bool,
    inbound: Inbound,
) -> Resolution {
    match inbound {
        Inbound::Command { name, payload } => resolve_command(&name, payload, terms_accepted),
        Inbound::Text(text) => resolve_text(current, terms_accepted, text),
        Inbound::Action(action) => resolve_action(action),
    }
}

fn resolve_command(name: &str, payload: Option<String>, terms_accepted: bool) -> Resolution {
    match name {
        "start" => match payload {
            // Deep link from a public post: open that submission's hub.
            Some(payload) => codec::decode_deep_link(&payload).map_or(
                Resolution::new(StateChange::Clear, Directive::InvalidInput),
                |submission_id| {
                    Resolution::new(StateChange::Clear, Directive::OpenHub { submission_id })
                },
            ),
            None if terms_accepted => Resolution::new(
                StateChange::Set(ConversationState::AwaitingShareType),
                Directive::AskShareType,
            ),
            None => Resolution::new(
                StateChange::Set(ConversationState::AwaitingTermsDecision),
                Directive::ShowTerms,
            ),
        },
        "cancel" => Resolution::new(StateChange::Clear, Directive::Cancelled),
        _ => Resolution::new(StateChange::Keep, Directive::UnknownCommand),
    }
}

fn resolve_text(
    current: Option<&ConversationState>,
    terms_accepted: bool,
    text: String,
) -> Resolution {
    match current {
        // First contact gets the terms; otherwise an idle message just
        // gets the menu, with no mutation.
        None if !terms_accepted => Resolution::new(
            StateChange::Set(ConversationState::AwaitingTermsDecision),
            Directive::ShowTerms,
        ),
        None => Resolution::new(StateChange::Keep, Directive::ShowMenu),
        Some(ConversationState::AwaitingTermsDecision) => {
            Resolution::new(StateChange::Keep, Directive::ShowTerms)
        }
        Some(ConversationState::AwaitingShareType) => {
            Resolution::new(StateChange::Keep, Directive::AskShareType)
        }
        Some(ConversationState::CollectingSubmission) => {
            Resolution::new(StateChange::Clear, Directive::CreateSubmission { text })
        }
        Some(ConversationState::CollectingComment { submission_id }) => Resolution::new(
            StateChange::Clear,
            Directive::CreateComment {
                submission_id: *submission_id,
                parent_id: None,
                text,
            },
        ),
        Some(ConversationState::CollectingReply {
            submission_id,
            parent_id,
        }) => Resolution::new(
            StateChange::Clear,
            Directive::CreateComment {
                submission_id: *submission_id,
                parent_id: Some(*parent_id),
                text,
            },
        ),
        // Only a reason button finalizes a report; free text re-prompts.
        Some(ConversationState::AwaitingReportReason {
            comment_id,
            submission_id,
        }) => Resolution::new(
            StateChange::Keep,
            Directive::AskReportReason {
                comment_id: *comment_id,
                submission_id: *submission_id,
            },
        ),
        Some(ConversationState::EditingProfileField {
            field: ProfileField::Alias,
        }) => Resolution::new(StateChange::Clear, Directive::SetAlias { value: text }),
    }
}

fn resolve_action(action: CallbackAction) -> Resolution {
    match action {
        CallbackAction::TermsAccept => Resolution::new(
            StateChange::Set(ConversationState::AwaitingShareType),
            Directive::TermsAccepted,
        ),
        CallbackAction::TermsDecline => {
            Resolution::new(StateChange::Clear, Directive::TermsDeclined)
        }
        CallbackAction::Share(kind) => Resolution::new(
            StateChange::Set(ConversationState::CollectingSubmission),
            Directive::PromptSubmission { kind },
        ),
        CallbackAction::AddComment { submission_id } => Resolution::new(
            StateChange::Set(ConversationState::CollectingComment { submission_id }),
            Directive::PromptComment { submission_id },
        ),
        CallbackAction::Reply {
            submission_id,
            parent_id,
        } => Resolution::new(
            StateChange::Set(ConversationState::CollectingReply {
                submission_id,
                parent_id,
            }),
            Directive::PromptReply {
                submission_id,
                parent_id,
            },
        ),
        CallbackAction::Browse {
            submission_id,
            page,
        } => Resolution::new(
            StateChange::Keep,
            Directive::BrowsePage {
                submission_id,
                page,
            },
        ),
        CallbackAction::Vote {
            comment_id,
            value,
            submission_id,
            page,
        } => Resolution::new(
            StateChange::Keep,
            Directive::CastVote {
                comment_id,
                value,
                submission_id,
                page,
            },
        ),
        CallbackAction::Report {
            comment_id,
            submission_id,
        } => Resolution::new(
            StateChange::Set(ConversationState::AwaitingReportReason {
                comment_id,
                submission_id,
            }),
            Directive::AskReportReason {
                comment_id,
                submission_id,
            },
        ),
        CallbackAction::Reason {
            comment_id,
            submission_id,
            index,
        } => Resolution::new(
            StateChange::Clear,
            Directive::FileReport {
                comment_id,
                submission_id,
                reason_index: index,
            },
        ),
        CallbackAction::Follow { submission_id } => Resolution::new(
            StateChange::Keep,
            Directive::ToggleFollow { submission_id },
        ),
        CallbackAction::EditAlias => Resolution::new(
            StateChange::Set(ConversationState::EditingProfileField {
                field: ProfileField::Alias,
            }),
            Directive::PromptAlias,
        ),
        CallbackAction::ModApprove { submission_id } => Resolution::new(
            StateChange::Keep,
            Directive::Moderate(ModerationDirective::Approve { submission_id }),
        ),
        CallbackAction::ModReject { submission_id } => Resolution::new(
            StateChange::Keep,
            Directive::Moderate(ModerationDirective::Reject { submission_id }),
        ),
        CallbackAction::ModDelete {
            comment_id,
            submission_id,
        } => Resolution::new(
            StateChange::Keep,
            Directive::Moderate(ModerationDirective::DeleteComment {
                comment_id,
                submission_id,
            }),
        ),
        CallbackAction::ModDismiss { comment_id } => Resolution::new(
            StateChange::Keep,
            Directive::Moderate(ModerationDirective::DismissReports { comment_id }),
        ),
        CallbackAction::Noop => Resolution::new(StateChange::Keep, Directive::Noop),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inbound {
        Inbound::Text(s.to_string())
    }

    #[test]
    fn test_start_without_consent_presents_terms() {
        let resolution = resolve(
            None,
            false,
            Inbound::Command {
                name: "start".to_string(),
                payload: None,
            },
        );

        assert_eq!(
            resolution.state,
            StateChange::Set(ConversationState::AwaitingTermsDecision)
        );
        assert_eq!(resolution.directive, Directive::ShowTerms);
    }

    #[test]
    fn test_start_with_consent_skips_terms() {
        let resolution = resolve(
            None,
            true,
            Inbound::Command {
                name: "start".to_string(),
                payload: None,
            },
        );

        assert_eq!(
            resolution.state,
            StateChange::Set(ConversationState::AwaitingShareType)
        );
        assert_eq!(resolution.directive, Directive::AskShareType);
    }

    #[test]
    fn test_deep_link_opens_hub() {
        let resolution = resolve(
            None,
            false,
            Inbound::Command {
                name: "start".to_string(),
                payload: Some("conf_55".to_string()),
            },
        );

        assert_eq!(
            resolution.directive,
            Directive::OpenHub { submission_id: 55 }
        );
    }

    #[test]
    fn test_malformed_deep_link_fails_closed() {
        let resolution = resolve(
            None,
            false,
            Inbound::Command {
                name: "start".to_string(),
                payload: Some("conf_abc".to_string()),
            },
        );

        assert_eq!(resolution.directive, Directive::InvalidInput);
        assert_eq!(resolution.state, StateChange::Clear);
    }

    #[test]
    fn test_terms_decline_ends_flow_with_no_side_effect() {
        let resolution = resolve(
            Some(&ConversationState::AwaitingTermsDecision),
            false,
            Inbound::Action(CallbackAction::TermsDecline),
        );

        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(resolution.directive, Directive::TermsDeclined);
    }

    #[test]
    fn test_cancel_clears_any_state() {
        let resolution = resolve(
            Some(&ConversationState::CollectingSubmission),
            true,
            Inbound::Command {
                name: "cancel".to_string(),
                payload: None,
            },
        );

        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(resolution.directive, Directive::Cancelled);
    }

    #[test]
    fn test_unknown_command_never_becomes_a_body() {
        let resolution = resolve(
            Some(&ConversationState::CollectingSubmission),
            true,
            Inbound::Command {
                name: "help".to_string(),
                payload: None,
            },
        );

        assert_eq!(resolution.state, StateChange::Keep);
        assert_eq!(resolution.directive, Directive::UnknownCommand);
    }

    #[test]
    fn test_collecting_submission_captures_text() {
        let resolution = resolve(
            Some(&ConversationState::CollectingSubmission),
            true,
            text("I ate the last slice"),
        );

        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(
            resolution.directive,
            Directive::CreateSubmission {
                text: "I ate the last slice".to_string()
            }
        );
    }

    #[test]
    fn test_collecting_comment_captures_text() {
        let resolution = resolve(
            Some(&ConversationState::CollectingComment { submission_id: 55 }),
            true,
            text("Nice!"),
        );

        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(
            resolution.directive,
            Directive::CreateComment {
                submission_id: 55,
                parent_id: None,
                text: "Nice!".to_string()
            }
        );
    }

    #[test]
    fn test_collecting_reply_sets_parent() {
        let resolution = resolve(
            Some(&ConversationState::CollectingReply {
                submission_id: 55,
                parent_id: 7,
            }),
            true,
            text("Agreed"),
        );

        assert_eq!(
            resolution.directive,
            Directive::CreateComment {
                submission_id: 55,
                parent_id: Some(7),
                text: "Agreed".to_string()
            }
        );
    }

    #[test]
    fn test_report_reason_requires_button() {
        let state = ConversationState::AwaitingReportReason {
            comment_id: 7,
            submission_id: 55,
        };

        // Free text re-prompts instead of finalizing.
        let resolution = resolve(Some(&state), true, text("it is spam"));
        assert_eq!(resolution.state, StateChange::Keep);
        assert_eq!(
            resolution.directive,
            Directive::AskReportReason {
                comment_id: 7,
                submission_id: 55
            }
        );

        // The button does finalize and clears the flow.
        let resolution = resolve(
            Some(&state),
            true,
            Inbound::Action(CallbackAction::Reason {
                comment_id: 7,
                submission_id: 55,
                index: 4,
            }),
        );
        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(
            resolution.directive,
            Directive::FileReport {
                comment_id: 7,
                submission_id: 55,
                reason_index: 4
            }
        );
    }

    #[test]
    fn test_idle_text_shows_menu_without_mutation() {
        let resolution = resolve(None, true, text("hello?"));

        assert_eq!(resolution.state, StateChange::Keep);
        assert_eq!(resolution.directive, Directive::ShowMenu);
    }

    #[test]
    fn test_first_contact_text_presents_terms() {
        let resolution = resolve(None, false, text("hello?"));

        assert_eq!(
            resolution.state,
            StateChange::Set(ConversationState::AwaitingTermsDecision)
        );
        assert_eq!(resolution.directive, Directive::ShowTerms);
    }

    #[test]
    fn test_alias_flow() {
        let resolution = resolve(None, true, Inbound::Action(CallbackAction::EditAlias));
        assert_eq!(
            resolution.state,
            StateChange::Set(ConversationState::EditingProfileField {
                field: ProfileField::Alias
            })
        );

        let resolution = resolve(
            Some(&ConversationState::EditingProfileField {
                field: ProfileField::Alias,
            }),
            true,
            text("NightOwl"),
        );
        assert_eq!(resolution.state, StateChange::Clear);
        assert_eq!(
            resolution.directive,
            Directive::SetAlias {
                value: "NightOwl".to_string()
            }
        );
    }

    #[test]
    fn test_vote_action_passes_through_statelessly() {
        let resolution = resolve(
            Some(&ConversationState::CollectingSubmission),
            true,
            Inbound::Action(CallbackAction::Vote {
                comment_id: 7,
                value: VoteValue::Up,
                submission_id: 55,
                page: 2,
            }),
        );

        // A vote from a stale keyboard must not disturb the typing flow.
        assert_eq!(resolution.state, StateChange::Keep);
        assert_eq!(
            resolution.directive,
            Directive::CastVote {
                comment_id: 7,
                value: VoteValue::Up,
                submission_id: 55,
                page: 2
            }
        );
    }
}
