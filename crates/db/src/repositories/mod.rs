//! Database repositories.
//!
//! One repository per table; all query construction lives here.

pub mod ban;
pub mod comment;
pub mod follow;
pub mod profile;
pub mod report;
pub mod submission;
pub mod vote;

pub use ban::BanRepository;
pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use profile::ProfileRepository;
pub use report::ReportRepository;
pub use submission::SubmissionRepository;
pub use vote::{VoteRepository, VoteTally};
