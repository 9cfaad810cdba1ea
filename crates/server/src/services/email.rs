//! Email service for operator notifications.
//!
//! Uses SMTP via lettre for delivery with Askama templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use udyog_core::Email;

use crate::config::EmailConfig;

pub const HANDOFF_SUBJECT: &str = "You have a new live conversation";

#[derive(Template)]
#[template(path = "email/handoff.html")]
struct HandoffEmailHtml<'a> {
    domain_name: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/handoff.txt")]
struct HandoffEmailText<'a> {
    domain_name: &'a str,
    dashboard_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    dashboard_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `dashboard_url` is linked from every notification.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, dashboard_url: String) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            dashboard_url,
        })
    }

    /// Tell a domain owner that a conversation switched to realtime mode.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or SMTP delivery fails.
    pub async fn send_handoff_notice(&self, to: &Email, domain_name: &str) -> Result<(), EmailError> {
        let (text, html) = render_handoff(domain_name, &self.dashboard_url)?;
        self.send_multipart_email(to.as_str(), HANDOFF_SUBJECT, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Render the text and HTML bodies of the handoff notice.
fn render_handoff(domain_name: &str, dashboard_url: &str) -> Result<(String, String), EmailError> {
    let text = HandoffEmailText {
        domain_name,
        dashboard_url,
    }
    .render()?;
    let html = HandoffEmailHtml {
        domain_name,
        dashboard_url,
    }
    .render()?;
    Ok((text, html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_handoff_mentions_domain() {
        let (text, html) =
            render_handoff("Acme", "https://udyog.ai/dashboard").expect("render");
        assert!(text.contains("A customer is waiting on Acme"));
        assert!(text.contains("https://udyog.ai/dashboard"));
        assert!(html.contains("<strong>Acme</strong>"));
    }

    #[test]
    fn test_render_handoff_escapes_html() {
        let (_, html) = render_handoff("<b>Evil</b>", "https://udyog.ai").expect("render");
        assert!(!html.contains("<b>Evil</b>"));
        assert!(html.contains("&#60;b&#62;Evil&#60;/b&#62;"));
    }
}
