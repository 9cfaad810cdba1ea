//! System prompt rendering and transcript normalization.

use askama::Template;

use udyog_core::{ChatRole, ChatTurn, CustomerId, DomainId};

/// Stands in for the customer id in portal links before the visitor has
/// given an email.
pub const CUSTOMER_ID_PLACEHOLDER: &str = "CUSTOMER_ID_NOT_FOUND";

#[derive(Template)]
#[template(path = "prompts/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    domain_name: &'a str,
    questions: &'a str,
    appointment_link: &'a str,
    payment_link: &'a str,
}

/// Builds appointment and payment links into the public portal.
#[derive(Debug, Clone)]
pub struct PortalLinks {
    origin: String,
}

impl PortalLinks {
    /// `origin` is the public web app URL without a trailing slash.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn appointment(&self, domain: DomainId, customer: Option<CustomerId>) -> String {
        self.link("appointment", domain, customer)
    }

    #[must_use]
    pub fn payment(&self, domain: DomainId, customer: Option<CustomerId>) -> String {
        self.link("payment", domain, customer)
    }

    fn link(&self, kind: &str, domain: DomainId, customer: Option<CustomerId>) -> String {
        let customer = customer.map_or_else(|| CUSTOMER_ID_PLACEHOLDER.to_string(), |c| c.to_string());
        format!("{}/portal/{domain}/{kind}/{customer}", self.origin)
    }
}

/// Render the sales-assistant instructions for one turn.
pub fn render_prompt(
    domain_name: &str,
    domain_id: DomainId,
    customer_id: Option<CustomerId>,
    questions: &[String],
    links: &PortalLinks,
) -> Result<String, askama::Error> {
    let appointment_link = links.appointment(domain_id, customer_id);
    let payment_link = links.payment(domain_id, customer_id);
    let questions = questions.join(", ");
    SystemPromptTemplate {
        domain_name,
        questions: &questions,
        appointment_link: &appointment_link,
        payment_link: &payment_link,
    }
    .render()
}

/// Build the turns sent to the model.
///
/// Leading assistant turns are dropped so the conversation opens with the
/// visitor, and the instructions are folded into that first user turn. With
/// no history left, the instructions and the new message form the first
/// turn. The new message is always appended last.
#[must_use]
pub fn build_conversation(
    prompt: &str,
    history: &[ChatTurn],
    author: ChatRole,
    message: &str,
) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = history
        .iter()
        .skip_while(|turn| turn.role == ChatRole::Assistant)
        .cloned()
        .collect();

    match turns.first_mut() {
        Some(first) => first.content = format!("{prompt}\n\n{}", first.content),
        None => turns.push(ChatTurn::user(format!("{prompt}\n\n{message}"))),
    }

    turns.push(ChatTurn {
        role: author,
        content: message.to_string(),
    });
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> DomainId {
        DomainId::parse("11111111-2222-4333-8444-555555555555").expect("uuid")
    }

    #[test]
    fn test_links_use_placeholder_without_customer() {
        let links = PortalLinks::new("http://localhost:3000/");
        assert_eq!(
            links.appointment(domain(), None),
            "http://localhost:3000/portal/11111111-2222-4333-8444-555555555555/appointment/CUSTOMER_ID_NOT_FOUND"
        );
        let customer = CustomerId::new(uuid::Uuid::nil());
        assert!(
            links
                .payment(domain(), Some(customer))
                .ends_with("/payment/00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_prompt_embeds_questions_markers_and_links() {
        let questions = vec!["What's your budget?".to_string(), "When do you start?".to_string()];
        let prompt = render_prompt(
            "Acme",
            domain(),
            None,
            &questions,
            &PortalLinks::new("http://localhost:3000"),
        )
        .expect("render");

        assert!(prompt.contains("sales representative for Acme"));
        assert!(prompt.contains("[What's your budget?, When do you start?]"));
        assert!(prompt.contains("(complete)"));
        assert!(prompt.contains("(realtime)"));
        assert!(prompt.contains("/appointment/CUSTOMER_ID_NOT_FOUND"));
        assert!(prompt.contains("/payment/CUSTOMER_ID_NOT_FOUND"));
    }

    #[test]
    fn test_prompt_does_not_html_escape() {
        let prompt = render_prompt(
            "Tom & Jerry's",
            domain(),
            None,
            &[],
            &PortalLinks::new("http://localhost:3000"),
        )
        .expect("render");
        assert!(prompt.contains("Tom & Jerry's"));
        assert!(prompt.contains("Questions to ask: []"));
    }

    #[test]
    fn test_leading_assistant_turns_dropped() {
        let history = vec![ChatTurn::assistant("hi"), ChatTurn::user("hello")];
        let turns = build_conversation("PROMPT", &history, ChatRole::User, "hello");

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ChatTurn::user("PROMPT\n\nhello"));
        assert!(!turns[0].content.starts_with("hi"));
        assert_eq!(turns[1], ChatTurn::user("hello"));
    }

    #[test]
    fn test_empty_history_seeds_prompt_with_message() {
        let turns = build_conversation("PROMPT", &[], ChatRole::User, "hey");
        assert_eq!(
            turns,
            vec![ChatTurn::user("PROMPT\n\nhey"), ChatTurn::user("hey")]
        );
    }

    #[test]
    fn test_only_assistant_history_treated_as_empty() {
        let history = vec![ChatTurn::assistant("Welcome!"), ChatTurn::assistant("Anyone?")];
        let turns = build_conversation("PROMPT", &history, ChatRole::User, "yes");
        assert_eq!(turns[0], ChatTurn::user("PROMPT\n\nyes"));
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn test_later_assistant_turns_kept() {
        let history = vec![
            ChatTurn::user("hello"),
            ChatTurn::assistant("What's your budget? (complete)"),
        ];
        let turns = build_conversation("PROMPT", &history, ChatRole::User, "$500");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[2], ChatTurn::user("$500"));
    }
}
