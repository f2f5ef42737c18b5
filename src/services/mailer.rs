use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Sends transactional email over SMTP. Without SMTP configuration the
/// message is logged instead of sent, which is what development wants.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl Mailer {
    pub fn new(config: Option<&SmtpConfig>) -> anyhow::Result<Self> {
        match config {
            Some(smtp) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
                    .credentials(Credentials::new(
                        smtp.username.clone(),
                        smtp.password.clone(),
                    ))
                    .port(smtp.port)
                    .build();
                Ok(Self {
                    transport: Some(transport),
                    from: smtp.from.clone(),
                })
            }
            None => Ok(Self::log_only()),
        }
    }

    pub fn log_only() -> Self {
        Self {
            transport: None,
            from: "UserHub <no-reply@userhub.local>".to_string(),
        }
    }

    pub async fn send_verification_otp(&self, to: &str, code: &str) -> anyhow::Result<()> {
        let body = format!(
            "Welcome to UserHub!\n\
            \n\
            Please verify your account using the following code:\n\
            \n\
            {}\n\
            \n\
            If you did not create this account, you can ignore this email.\n\
            \n\
            Best regards,\n\
            The UserHub Team",
            code
        );
        self.send(to, "Verify your UserHub account", &body).await
    }

    pub async fn send_password_reset_otp(&self, to: &str, code: &str) -> anyhow::Result<()> {
        let body = format!(
            "Hello,\n\
            \n\
            A password reset was requested for your UserHub account.\n\
            \n\
            To reset your password, use the following code:\n\
            \n\
            {}\n\
            \n\
            If you did not request this reset, please ignore this email and \
            ensure your account is secure.\n\
            \n\
            Best regards,\n\
            The UserHub Team",
            code
        );
        self.send(to, "Password reset request", &body).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let Some(transport) = &self.transport else {
            tracing::info!("Email to {}: {}\n{}", to, subject, body);
            return Ok(());
        };

        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid from address: {}", e))?,
            )
            .to(to
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        Ok(())
    }
}
