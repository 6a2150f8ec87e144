// src/services/mailer.rs

//! Update notifications by mail.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::MailSettings;

/// Submission port used when `out_server` has none.
const DEFAULT_SMTP_PORT: u16 = 587;

/// Delivery of "page updated" notifications.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `body` for the page at `url` to `recipient` from `account`.
    async fn send(
        &self,
        account: &MailSettings,
        url: &Url,
        recipient: &str,
        body: &str,
    ) -> Result<()>;
}

/// Mailer submitting messages over SMTP with STARTTLS.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer;

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        account: &MailSettings,
        url: &Url,
        recipient: &str,
        body: &str,
    ) -> Result<()> {
        let message = compose(account, url, recipient, body)?;
        let (host, port) = split_server(&account.out_server)?;

        let tls = TlsParameters::new(account.auth_server.clone()).map_err(AppError::mail)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .tls(Tls::Required(tls))
            .credentials(Credentials::new(
                account.address.clone(),
                account.password.clone(),
            ))
            .build();

        transport.send(message).await.map_err(AppError::mail)?;
        log::info!("Notified {} about {}", recipient, url);
        Ok(())
    }
}

/// Build the notification message.
pub fn compose(account: &MailSettings, url: &Url, recipient: &str, body: &str) -> Result<Message> {
    let from: Mailbox = account.address.parse().map_err(AppError::mail)?;
    let to: Mailbox = recipient.parse().map_err(AppError::mail)?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject(url))
        .header(ContentType::TEXT_HTML)
        .body(html_body(url, body))
        .map_err(AppError::mail)
}

fn subject(url: &Url) -> String {
    format!("[ pagewatch ] {}: update", url.host_str().unwrap_or_default())
}

fn html_body(url: &Url, selection: &str) -> String {
    format!("<a href=\"{url}\">{url}</a> has been updated :) <hr>\n{selection}\n")
}

/// Split `host[:port]`.
fn split_server(server: &str) -> Result<(&str, u16)> {
    match server.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| {
                AppError::config(format!("invalid port in mail.out_server `{server}`"))
            })?;
            Ok((host, port))
        }
        None => Ok((server, DEFAULT_SMTP_PORT)),
    }
}
