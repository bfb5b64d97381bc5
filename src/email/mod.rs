pub mod templates;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Outbound notification mailer. Optional at runtime; every call site is
/// fire-and-forget and only logs failures.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    pub async fn send_welcome(
        &self,
        to_email: &str,
        to_name: &str,
        base_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_welcome(to_name, base_url);
        self.send(to_email, "Welcome to Leadhub", &html).await
    }

    pub async fn send_agent_invite(
        &self,
        to_email: &str,
        to_name: &str,
        temp_password: &str,
        base_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_agent_invite(to_name, temp_password, base_url);
        self.send(to_email, "You were added as an agent - Leadhub", &html)
            .await
    }

    pub async fn send_lead_created(&self, to_email: &str, base_url: &str) -> Result<(), String> {
        let html = templates::render_lead_created(base_url);
        self.send(to_email, "A lead has been created", &html).await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}
