//! Per-user conversation state machine.
//!
//! An inbound event (free text, command, or decoded button press) plus the
//! user's current [`ConversationState`] resolves to a [`engine::Resolution`]:
//! the next state and a typed directive the dispatcher executes. The engine
//! itself is pure; state lives in a [`session::SessionStore`] keyed by user
//! id so a durable implementation can replace the in-memory one without
//! touching dispatch logic.

pub mod engine;
pub mod session;

pub use engine::{Directive, Inbound, ModerationDirective, Resolution, StateChange, resolve};
pub use session::{InMemorySessionStore, SessionStore};

/// The profile field being edited in a conversation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    /// The anonymous display alias shown on comments.
    Alias,
}

/// Where a user currently is in a multi-step flow.
///
/// Ephemeral and in-memory: a redeploy loses in-progress flows, never
/// completed mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Terms shown, waiting for accept/decline.
    AwaitingTermsDecision,
    /// Terms accepted, waiting for the share-type choice.
    AwaitingShareType,
    /// The next free text is the confession body.
    CollectingSubmission,
    /// The next free text is a top-level comment.
    CollectingComment { submission_id: i64 },
    /// The next free text is a reply to `parent_id`.
    CollectingReply { submission_id: i64, parent_id: i64 },
    /// Reason picker shown; only a reason button finalizes the report.
    AwaitingReportReason { comment_id: i64, submission_id: i64 },
    /// The next free text is the new value for a profile field.
    EditingProfileField { field: ProfileField },
}
