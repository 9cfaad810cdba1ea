//! Classification of a raw model reply.
//!
//! The model signals intent with literal markers in its text. The reply is
//! inspected once here and the rest of the turn branches on [`ReplyKind`].

use udyog_core::ChatTurn;

use super::scan;

/// Appended by the model to each qualification question it asks.
pub const COMPLETE_MARKER: &str = "(complete)";

/// Appended by the model when a human should take over.
pub const REALTIME_MARKER: &str = "(realtime)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Hand the conversation to a human operator.
    Escalate,
    /// The visitor's message answers the qualification question asked last.
    AnswerCapture,
    Reply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub kind: ReplyKind,
    /// Reply text; marker-free for `Escalate`, verbatim otherwise.
    pub text: String,
    /// First URL in the reply. Never set for `Escalate`.
    pub link: Option<String>,
}

impl ModelReply {
    /// Classify `raw` given the last turn the widget sent as history.
    #[must_use]
    pub fn parse(raw: &str, last_turn: Option<&ChatTurn>) -> Self {
        if raw.contains(REALTIME_MARKER) {
            return Self {
                kind: ReplyKind::Escalate,
                text: raw.replace(REALTIME_MARKER, "").trim().to_string(),
                link: None,
            };
        }

        let kind = if last_turn.is_some_and(|turn| turn.content.contains(COMPLETE_MARKER)) {
            ReplyKind::AnswerCapture
        } else {
            ReplyKind::Reply
        };

        Self {
            kind,
            text: raw.to_string(),
            link: scan::first_url(raw).map(str::to_string),
        }
    }

    /// Text to store and send back to the widget.
    #[must_use]
    pub fn outgoing(&self) -> String {
        match &self.link {
            Some(link) => link_reply(link),
            None => self.text.clone(),
        }
    }
}

/// The fixed sentence that replaces any reply carrying a link.
#[must_use]
pub fn link_reply(link: &str) -> String {
    format!("Great! you can follow the link to proceed: {link}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_marker_escalates_and_is_stripped() {
        let reply = ModelReply::parse(
            "That's beyond me (realtime) I'll get someone. (realtime) ",
            None,
        );
        assert_eq!(reply.kind, ReplyKind::Escalate);
        assert_eq!(reply.text, "That's beyond me  I'll get someone.");
        assert!(!reply.outgoing().contains(REALTIME_MARKER));
    }

    #[test]
    fn test_escalation_wins_over_link() {
        let reply = ModelReply::parse("See https://acme.io (realtime)", None);
        assert_eq!(reply.kind, ReplyKind::Escalate);
        assert_eq!(reply.link, None);
        assert_eq!(reply.outgoing(), "See https://acme.io");
    }

    #[test]
    fn test_complete_marker_in_last_turn_captures_answer() {
        let last = ChatTurn::assistant("What's your budget? (complete)");
        let reply = ModelReply::parse("Thanks! Anything else?", Some(&last));
        assert_eq!(reply.kind, ReplyKind::AnswerCapture);
        assert_eq!(reply.outgoing(), "Thanks! Anything else?");
    }

    #[test]
    fn test_complete_marker_only_counts_in_history() {
        let last = ChatTurn::assistant("How can I help?");
        let reply = ModelReply::parse("What's your budget? (complete)", Some(&last));
        assert_eq!(reply.kind, ReplyKind::Reply);
        assert_eq!(reply.text, "What's your budget? (complete)");
    }

    #[test]
    fn test_link_replaces_reply_text() {
        let reply = ModelReply::parse(
            "Sure! Book at http://localhost:3000/portal/d/appointment/c and see you then.",
            None,
        );
        assert_eq!(
            reply.outgoing(),
            "Great! you can follow the link to proceed: http://localhost:3000/portal/d/appointment/c"
        );
    }

    #[test]
    fn test_answer_capture_keeps_link() {
        let last = ChatTurn::assistant("Ready to buy? (complete)");
        let reply = ModelReply::parse("Pay here https://udyog.ai/portal/d/payment/c", Some(&last));
        assert_eq!(reply.kind, ReplyKind::AnswerCapture);
        assert_eq!(reply.link.as_deref(), Some("https://udyog.ai/portal/d/payment/c"));
    }
}
