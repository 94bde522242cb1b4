//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod moderation;
pub mod profile;
pub mod report;
pub mod sync;
pub mod vote;

pub use comment::{CommentPage, CommentService, RankedComment, RankedReply};
pub use follow::FollowService;
pub use moderation::{Decision, ModerationService, extract_review_text};
pub use profile::{DEFAULT_ALIAS, ProfileService};
pub use report::{ReportOutcome, ReportService};
pub use sync::CounterSyncService;
pub use vote::VoteService;
