//! User-facing texts and keyboards.

use confide_core::codec::{CallbackAction, ShareKind};
use confide_core::services::comment::{CommentPage, RankedComment};
use confide_core::transport::{InlineButton, InlineKeyboard};
use confide_db::entities::submission;
use confide_db::repositories::VoteTally;

/// Terms shown on first contact.
pub const TERMS_TEXT: &str = "📜 Terms & Conditions\n\n\
    1. Moderators will review your message.\n\
    2. Moderators see your identity during review.\n\
    3. Approved messages are posted anonymously.\n\n\
    Click Accept to continue.";

pub fn terms_keyboard() -> InlineKeyboard {
    InlineKeyboard::default()
        .row(vec![InlineButton::callback(
            "✅ Accept Terms",
            CallbackAction::TermsAccept.encode(),
        )])
        .row(vec![InlineButton::callback(
            "❌ Decline",
            CallbackAction::TermsDecline.encode(),
        )])
}

pub fn share_keyboard() -> InlineKeyboard {
    InlineKeyboard::default()
        .row(vec![InlineButton::callback(
            "💬 Experience",
            CallbackAction::Share(ShareKind::Experience).encode(),
        )])
        .row(vec![InlineButton::callback(
            "💭 Thought",
            CallbackAction::Share(ShareKind::Thought).encode(),
        )])
}

/// Idle menu for a message outside any flow.
pub const MENU_TEXT: &str =
    "Send /start to share a confession, or use the buttons under a published post to engage.";

pub fn menu_keyboard() -> InlineKeyboard {
    InlineKeyboard::default().row(vec![InlineButton::callback(
        "✏️ Edit Alias",
        CallbackAction::EditAlias.encode(),
    )])
}

/// The comment hub opened from a public post's deep link.
pub fn hub_text(submission: &submission::Model) -> String {
    format!(
        "Confession #{}\n\n{}\n\nYou can always 🚩 report inappropriate comments.\n\n\
         Select an option below:",
        submission.id, submission.text
    )
}

pub fn hub_keyboard(submission_id: i64, comment_count: u64) -> InlineKeyboard {
    InlineKeyboard::default()
        .row(vec![InlineButton::callback(
            "➕ Add Comment",
            CallbackAction::AddComment { submission_id }.encode(),
        )])
        .row(vec![InlineButton::callback(
            format!("📂 Browse Comments ({comment_count})"),
            CallbackAction::Browse {
                submission_id,
                page: 1,
            }
            .encode(),
        )])
        .row(vec![InlineButton::callback(
            "🔔 Follow",
            CallbackAction::Follow { submission_id }.encode(),
        )])
}

/// One comment with its replies, as message text.
pub fn comment_text(item: &RankedComment) -> String {
    let mut text = format!("💬 {}\n👤 {}", item.comment.text, item.comment.author_label);
    for reply in &item.replies {
        text.push_str(&format!(
            "\n    ↪ {} — {}",
            reply.comment.text, reply.comment.author_label
        ));
    }
    text
}

/// Vote/report/reply controls under a comment.
pub fn comment_keyboard(
    comment_id: i64,
    submission_id: i64,
    page: u64,
    tally: VoteTally,
) -> InlineKeyboard {
    use confide_db::entities::vote::VoteValue;

    InlineKeyboard::default().row(vec![
        InlineButton::callback(
            format!("👍 {}", tally.likes),
            CallbackAction::Vote {
                comment_id,
                value: VoteValue::Up,
                submission_id,
                page,
            }
            .encode(),
        ),
        InlineButton::callback(
            format!("👎 {}", tally.dislikes),
            CallbackAction::Vote {
                comment_id,
                value: VoteValue::Down,
                submission_id,
                page,
            }
            .encode(),
        ),
        InlineButton::callback(
            "↩",
            CallbackAction::Reply {
                submission_id,
                parent_id: comment_id,
            }
            .encode(),
        ),
        InlineButton::callback(
            "🚩",
            CallbackAction::Report {
                comment_id,
                submission_id,
            }
            .encode(),
        ),
    ])
}

/// Pager summary line under a browse listing.
pub fn pager_text(page: &CommentPage) -> String {
    format!(
        "Displaying page {}/{}. Total {} Comments",
        page.page, page.total_pages, page.total
    )
}

/// Prev/indicator/next row plus an add-comment row.
pub fn pager_keyboard(submission_id: i64, page: &CommentPage) -> InlineKeyboard {
    let mut nav = Vec::new();
    if page.has_prev() {
        nav.push(InlineButton::callback(
            "⬅ Prev",
            CallbackAction::Browse {
                submission_id,
                page: page.page - 1,
            }
            .encode(),
        ));
    }
    nav.push(InlineButton::callback(
        format!("Page {}/{}", page.page, page.total_pages),
        CallbackAction::Noop.encode(),
    ));
    if page.has_next() {
        nav.push(InlineButton::callback(
            "Next ➡",
            CallbackAction::Browse {
                submission_id,
                page: page.page + 1,
            }
            .encode(),
        ));
    }

    InlineKeyboard::default().row(nav).row(vec![InlineButton::callback(
        "➕ Add Comment",
        CallbackAction::AddComment { submission_id }.encode(),
    )])
}

/// Reason picker for a report, two reasons per row, with a cancel row.
pub fn reason_keyboard(comment_id: i64, submission_id: i64, reasons: &[String]) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::default();
    for (row_start, pair) in reasons.chunks(2).enumerate() {
        let row = pair
            .iter()
            .enumerate()
            .map(|(offset, reason)| {
                InlineButton::callback(
                    reason.clone(),
                    CallbackAction::Reason {
                        comment_id,
                        submission_id,
                        index: row_start * 2 + offset,
                    }
                    .encode(),
                )
            })
            .collect();
        keyboard = keyboard.row(row);
    }
    keyboard.row(vec![InlineButton::callback(
        "❌ Cancel",
        CallbackAction::Noop.encode(),
    )])
}
