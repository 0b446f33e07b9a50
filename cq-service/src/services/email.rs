//! Invitation mails, sent best-effort via SMTP.

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use service_core::error::AppError;
use std::time::Duration;

use crate::config::SmtpConfig;

/// Role label used in project invitation mails.
#[derive(Debug, Clone, Copy)]
pub enum ProjectRoleLabel {
    Manager,
    OntologyEngineer,
}

impl ProjectRoleLabel {
    fn as_str(self) -> &'static str {
        match self {
            ProjectRoleLabel::Manager => "manager",
            ProjectRoleLabel::OntologyEngineer => "ontology engineer",
        }
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.relay)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(relay = %config.relay, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.from_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::InternalError(e.into()))?;

        // Send in the blocking thread pool to avoid blocking the runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => Err(AppError::EmailError(e.to_string())),
        }
    }

    /// Initial credentials for a user created through an invitation flow.
    pub async fn send_account_invitation(
        &self,
        to_email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        let subject = "You've been invited to join CQ-Manager!";
        let body = format!(
            "You've been invited to join CQ-Manager!\n\nYour initial credentials are: '{to_email}' & '{password}'."
        );
        self.send_email(to_email, subject, &body).await
    }

    pub async fn send_project_invitation(
        &self,
        to_email: &str,
        project_name: &str,
        role: ProjectRoleLabel,
    ) -> Result<(), AppError> {
        let subject = format!("Welcome to {project_name} on CQ-Manager!");
        let body = format!(
            "You've been assigned as '{}' to '{project_name}' a project on CQ-Manager.",
            role.as_str()
        );
        self.send_email(to_email, &subject, &body).await
    }

    pub async fn send_group_invitation(
        &self,
        to_email: &str,
        group_name: &str,
        project_name: &str,
    ) -> Result<(), AppError> {
        let subject = format!("Welcome to '{group_name}' on CQ-Manager!");
        let body = format!(
            "You've been added to '{group_name}' a group within the '{project_name}' project on CQ-Manager."
        );
        self.send_email(to_email, &subject, &body).await
    }
}
