use crate::core::config::SmtpConfig;
use crate::core::AppError;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::str::FromStr;

/// Outbound email capability.
pub trait Mailer: Send + Sync {
    fn send_html(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

pub struct EmailService {
    smtp_config: SmtpConfig,
}

impl EmailService {
    pub fn new(smtp_config: SmtpConfig) -> Self {
        Self { smtp_config }
    }

    fn create_smtp_transport(&self) -> Result<SmtpTransport, AppError> {
        let credentials = Credentials::new(
            self.smtp_config.username.clone(),
            self.smtp_config.password.expose_secret().clone(),
        );

        // Mailtrap (port 2525) only speaks STARTTLS
        let builder = if self.smtp_config.port == 2525 {
            SmtpTransport::starttls_relay(&self.smtp_config.host)
        } else {
            SmtpTransport::relay(&self.smtp_config.host)
        }
        .map_err(|e| AppError::internal_error(format!("Failed to create SMTP transport: {}", e)))?;

        Ok(builder
            .port(self.smtp_config.port)
            .credentials(credentials)
            .build())
    }
}

impl Mailer for EmailService {
    fn send_html(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.smtp_config.from_name, self.smtp_config.from_email
        ))
        .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = self.create_smtp_transport()?;

        match mailer.send(&email) {
            Ok(_) => {
                tracing::info!("Email '{}' sent successfully to: {}", subject, to_email);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", to_email, e);
                Err(AppError {
                    error_type: crate::core::AppErrorType::EmailError,
                    message: Some(format!("Failed to send email: {}", e)),
                    cause: Some(e.to_string()),
                })
            }
        }
    }
}

pub const VERIFICATION_SUBJECT: &str = "Verify your Fitness Gym account";
pub const RESEND_VERIFICATION_SUBJECT: &str = "Your new Fitness Gym verification link";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your Fitness Gym password";

fn email_layout(title: &str, content: &str) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="border: 2px solid #4a9ced; border-radius: 10px; padding: 20px;">
        <h2 style="color: #ff9966; text-align: center;">{title}</h2>
        {content}
        <p style="text-align: center; margin-top: 30px; font-size: 12px; color: #777;">
            This is an automated message, please do not reply.
        </p>
    </div>
</body>
</html>
"#
    )
}

fn action_button(link: &str, label: &str) -> String {
    format!(
        r#"<div style="text-align: center; margin: 30px 0;">
            <a href="{link}" style="background: #ff9966; color: white; text-decoration: none; padding: 12px 30px; border-radius: 25px; font-weight: bold;">{label}</a>
        </div>"#
    )
}

pub fn verification_email_body(name: &str, link: &str, valid_hours: i64) -> String {
    let content = format!(
        r#"<p>Hello {name},</p>
        <p>You are one step away from completing your registration. Please confirm your email address:</p>
        {button}
        <p>This link is valid for {valid_hours} hours.</p>
        <p>If you did not sign up, you can ignore this email.</p>"#,
        button = action_button(link, "Verify my account"),
    );
    email_layout("Welcome to Fitness Gym", &content)
}

pub fn password_reset_email_body(name: &str, link: &str, valid_minutes: i64) -> String {
    let content = format!(
        r#"<p>Hello {name},</p>
        <p>We received a request to reset your password:</p>
        {button}
        <p>This link is valid for {valid_minutes} minutes. If you did not ask for a reset, ignore this email.</p>"#,
        button = action_button(link, "Reset password"),
    );
    email_layout("Password reset", &content)
}
