use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SMTP_RELAY: &str = "smtp.gmail.com";
const REPORT_SUBJECT: &str = "Crypto Price Report";
const REPORT_BODY: &str = "Attached is the latest crypto price report";

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("{0} environment variable not found")]
    MissingVar(&'static str),
    #[error("Invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build the report message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outbound mail account, validated once at startup. The report is sent from
/// and to the same address over the relay's implicit-TLS submission port.
pub struct EmailConfig {
    user_email: String,
    smtp_password: String,
}

impl EmailConfig {
    pub fn new() -> Result<Self, EmailError> {
        Self::from_values(
            env::var("SMTP_FROM_EMAIL").ok(),
            env::var("SMTP_PASSWORD").ok(),
        )
    }

    fn from_values(
        user_email: Option<String>,
        smtp_password: Option<String>,
    ) -> Result<Self, EmailError> {
        Ok(EmailConfig {
            user_email: user_email.ok_or(EmailError::MissingVar("SMTP_FROM_EMAIL"))?,
            smtp_password: smtp_password.ok_or(EmailError::MissingVar("SMTP_PASSWORD"))?,
        })
    }

    /// Send the persisted price log as a generic binary attachment.
    pub fn send_price_log(&self, attachment_path: &Path) -> Result<(), EmailError> {
        let file_data =
            std::fs::read(attachment_path).map_err(|source| EmailError::Attachment {
                path: attachment_path.to_path_buf(),
                source,
            })?;

        let file_name = attachment_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("crypto_price_log.csv")
            .to_string();

        let content_type =
            ContentType::parse("application/octet-stream").expect("Failed to parse content type");
        let attachment = Attachment::new(file_name).body(file_data, content_type);

        let email = Message::builder()
            .from(self.user_email.parse()?)
            .to(self.user_email.parse()?)
            .subject(REPORT_SUBJECT)
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(REPORT_BODY.to_string()),
                    )
                    .singlepart(attachment),
            )?;

        let creds = Credentials::new(self.user_email.clone(), self.smtp_password.clone());

        let mailer = SmtpTransport::relay(SMTP_RELAY)?
            .credentials(creds)
            .build();

        mailer.send(&email)?;
        println!("\nPrice log sent by email to {}!", self.user_email);

        Ok(())
    }
}
