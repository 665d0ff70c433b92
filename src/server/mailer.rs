//! Contact form email rendering and delivery through an http mail relay.

use crate::server::model::config::MailConfig;
use crate::server::model::contact::ContactForm;
use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Display, Error)]
pub enum MailError {
    #[display("mail relay is not configured")]
    NotConfigured,
    #[display("mail relay request failed: {_0}")]
    Transport(#[error(source)] reqwest::Error),
}

impl From<reqwest::Error> for MailError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Posts mail as json to a relay endpoint with basic auth.
pub struct HttpMailRelay {
    client: reqwest::Client,
    endpoint: Option<String>,
    user: String,
    password: String,
}

impl HttpMailRelay {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.relay_url.clone(),
            user: config.relay_user.clone(),
            password: config.relay_password.clone(),
        }
    }
}

#[async_trait]
impl MailRelay for HttpMailRelay {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let endpoint = self.endpoint.as_deref().ok_or(MailError::NotConfigured)?;
        self.client
            .post(endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(mail)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Builds the notification email for a contact form submission.
pub fn contact_mail(form: &ContactForm, config: &MailConfig) -> OutgoingMail {
    let row = |label: &str, value: &str| {
        format!(
            "<tr><td style=\"padding:4px 12px;font-weight:bold\">{label}</td><td style=\"padding:4px 12px\">{}</td></tr>",
            escape_html(value)
        )
    };
    let mut html = String::from("<div style=\"font-family:sans-serif\"><h2>New contact request</h2><table>");
    html.push_str(&row("Name", &form.name));
    html.push_str(&row("Hotel", &form.hotel_name));
    html.push_str(&row("Email", &form.email));
    html.push_str(&row("Phone", &form.phone));
    html.push_str(&row("Rooms", &form.room_count));
    html.push_str("</table>");
    if let Some(message) = &form.message {
        html.push_str(&format!(
            "<h3>Message</h3><p style=\"white-space:pre-wrap\">{}</p>",
            escape_html(message)
        ));
    }
    html.push_str("</div>");

    OutgoingMail {
        from: config.from_address.clone(),
        to: config.contact_address.clone(),
        reply_to: form.email.clone(),
        subject: format!("New contact request from {}", form.hotel_name),
        html,
    }
}
