//! Callback and deep-link codecs.
//!
//! Every interactive control carries an action tag plus a fixed, ordered
//! argument list, encoded as a colon-separated string. Decoding validates
//! arity and types and fails closed: malformed input decodes to `None` and
//! the dispatcher answers "invalid" instead of acting.

use confide_db::entities::vote::VoteValue;

/// What a user chose to share. Only affects the prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    Experience,
    Thought,
}

impl ShareKind {
    const fn tag(self) -> &'static str {
        match self {
            Self::Experience => "experience",
            Self::Thought => "thought",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "experience" => Some(Self::Experience),
            "thought" => Some(Self::Thought),
            _ => None,
        }
    }
}

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// User accepted the terms.
    TermsAccept,
    /// User declined the terms.
    TermsDecline,
    /// User picked what kind of text they are sharing.
    Share(ShareKind),
    /// Start collecting a top-level comment on a submission.
    AddComment { submission_id: i64 },
    /// Start collecting a reply to a comment.
    Reply { submission_id: i64, parent_id: i64 },
    /// Show a page of comments.
    Browse { submission_id: i64, page: u64 },
    /// Cast or toggle a vote; carries the page for re-render.
    Vote {
        comment_id: i64,
        value: VoteValue,
        submission_id: i64,
        page: u64,
    },
    /// Open the report-reason picker for a comment.
    Report { comment_id: i64, submission_id: i64 },
    /// A reason was picked, by index into the configured reason list.
    Reason {
        comment_id: i64,
        submission_id: i64,
        index: usize,
    },
    /// Toggle following a submission's comment activity.
    Follow { submission_id: i64 },
    /// Start editing the anonymous alias.
    EditAlias,
    /// Moderator approves a pending submission.
    ModApprove { submission_id: i64 },
    /// Moderator rejects a pending submission.
    ModReject { submission_id: i64 },
    /// Moderator deletes a reported comment.
    ModDelete { comment_id: i64, submission_id: i64 },
    /// Moderator dismisses the reports on a comment.
    ModDismiss { comment_id: i64 },
    /// Inert button (page indicator, cancel).
    Noop,
}

impl CallbackAction {
    /// Encode the action into callback data.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::TermsAccept => "terms:accept".to_string(),
            Self::TermsDecline => "terms:decline".to_string(),
            Self::Share(kind) => format!("share:{}", kind.tag()),
            Self::AddComment { submission_id } => format!("cmt:{submission_id}"),
            Self::Reply {
                submission_id,
                parent_id,
            } => format!("reply:{submission_id}:{parent_id}"),
            Self::Browse {
                submission_id,
                page,
            } => format!("browse:{submission_id}:{page}"),
            Self::Vote {
                comment_id,
                value,
                submission_id,
                page,
            } => {
                let dir = match value {
                    VoteValue::Up => "up",
                    VoteValue::Down => "down",
                };
                format!("vote:{comment_id}:{dir}:{submission_id}:{page}")
            }
            Self::Report {
                comment_id,
                submission_id,
            } => format!("rep:{comment_id}:{submission_id}"),
            Self::Reason {
                comment_id,
                submission_id,
                index,
            } => format!("reason:{comment_id}:{submission_id}:{index}"),
            Self::Follow { submission_id } => format!("follow:{submission_id}"),
            Self::EditAlias => "alias".to_string(),
            Self::ModApprove { submission_id } => format!("mod:approve:{submission_id}"),
            Self::ModReject { submission_id } => format!("mod:reject:{submission_id}"),
            Self::ModDelete {
                comment_id,
                submission_id,
            } => format!("mod:del:{comment_id}:{submission_id}"),
            Self::ModDismiss { comment_id } => format!("mod:dis:{comment_id}"),
            Self::Noop => "noop".to_string(),
        }
    }

    /// Decode callback data. Returns `None` on unknown tags, wrong arity,
    /// or non-numeric arguments.
    #[must_use]
    pub fn decode(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();

        match parts.as_slice() {
            ["terms", "accept"] => Some(Self::TermsAccept),
            ["terms", "decline"] => Some(Self::TermsDecline),
            ["share", kind] => ShareKind::from_tag(kind).map(Self::Share),
            ["cmt", s] => Some(Self::AddComment {
                submission_id: s.parse().ok()?,
            }),
            ["reply", s, p] => Some(Self::Reply {
                submission_id: s.parse().ok()?,
                parent_id: p.parse().ok()?,
            }),
            ["browse", s, page] => Some(Self::Browse {
                submission_id: s.parse().ok()?,
                page: page.parse().ok()?,
            }),
            ["vote", c, dir, s, page] => {
                let value = match *dir {
                    "up" => VoteValue::Up,
                    "down" => VoteValue::Down,
                    _ => return None,
                };
                Some(Self::Vote {
                    comment_id: c.parse().ok()?,
                    value,
                    submission_id: s.parse().ok()?,
                    page: page.parse().ok()?,
                })
            }
            ["rep", c, s] => Some(Self::Report {
                comment_id: c.parse().ok()?,
                submission_id: s.parse().ok()?,
            }),
            ["reason", c, s, i] => Some(Self::Reason {
                comment_id: c.parse().ok()?,
                submission_id: s.parse().ok()?,
                index: i.parse().ok()?,
            }),
            ["follow", s] => Some(Self::Follow {
                submission_id: s.parse().ok()?,
            }),
            ["alias"] => Some(Self::EditAlias),
            ["mod", "approve", s] => Some(Self::ModApprove {
                submission_id: s.parse().ok()?,
            }),
            ["mod", "reject", s] => Some(Self::ModReject {
                submission_id: s.parse().ok()?,
            }),
            ["mod", "del", c, s] => Some(Self::ModDelete {
                comment_id: c.parse().ok()?,
                submission_id: s.parse().ok()?,
            }),
            ["mod", "dis", c] => Some(Self::ModDismiss {
                comment_id: c.parse().ok()?,
            }),
            ["noop"] => Some(Self::Noop),
            _ => None,
        }
    }
}

/// Deep-link payload prefix on `/start`.
const DEEP_LINK_PREFIX: &str = "conf_";

/// Encode a submission id as a `/start` deep-link payload.
#[must_use]
pub fn encode_deep_link(submission_id: i64) -> String {
    format!("{DEEP_LINK_PREFIX}{submission_id}")
}

/// Decode a `/start` deep-link payload back into a submission id.
#[must_use]
pub fn decode_deep_link(payload: &str) -> Option<i64> {
    payload.strip_prefix(DEEP_LINK_PREFIX)?.parse().ok()
}
