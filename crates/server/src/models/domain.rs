//! Domain (tenant site) types.

use serde::Serialize;

use udyog_core::{ChatBotId, DomainId, HelpDeskId};

/// What the assistant needs to know about a domain for one turn.
#[derive(Debug, Clone)]
pub struct AssistantDomain {
    pub id: DomainId,
    pub name: String,
    /// Identity-provider user id of the operator who owns the domain.
    pub owner_user_id: String,
    /// Filter questions nobody has answered yet, oldest first.
    pub pending_questions: Vec<String>,
}

/// Widget configuration served to the embedded chatbot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub name: String,
    pub chat_bot: Option<ChatBotSettings>,
    pub helpdesk: Vec<HelpDeskEntry>,
}

/// Appearance and behaviour of a domain's chatbot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBotSettings {
    pub id: ChatBotId,
    pub welcome_message: Option<String>,
    pub icon: Option<String>,
    pub text_color: Option<String>,
    pub background: Option<String>,
    pub helpdesk: bool,
}

/// A FAQ entry shown in the widget's help desk tab.
#[derive(Debug, Clone, Serialize)]
pub struct HelpDeskEntry {
    pub id: HelpDeskId,
    pub question: String,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_config_wire_shape() {
        let config = WidgetConfig {
            name: "Acme".to_string(),
            chat_bot: Some(ChatBotSettings {
                id: ChatBotId::new(uuid::Uuid::nil()),
                welcome_message: Some("Hey there".to_string()),
                icon: None,
                text_color: Some("#fff".to_string()),
                background: None,
                helpdesk: true,
            }),
            helpdesk: Vec::new(),
        };

        let json = serde_json::to_value(&config).expect("serialize");
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["chatBot"]["welcomeMessage"], "Hey there");
        assert_eq!(json["chatBot"]["textColor"], "#fff");
        assert_eq!(json["chatBot"]["helpdesk"], true);
        assert!(json["helpdesk"].as_array().is_some_and(Vec::is_empty));
    }
}
