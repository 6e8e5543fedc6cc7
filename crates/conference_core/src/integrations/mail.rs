//! Outbound mail gated by the configured allow-list.

use crate::integrations::CollaboratorResult;
use crate::settings::ConferenceSettings;
use log::info;

/// Mail as written by the caller; unset fields fall back to settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailDraft {
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
    pub recipient_list: Option<Vec<String>>,
}

/// Fully addressed message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub recipient_list: Vec<String>,
}

/// Mail transport (SMTP client, test outbox...).
pub trait Mailer {
    fn send(&self, message: &MailMessage) -> CollaboratorResult<()>;
}

/// Sends `draft` unless mail is disabled.
///
/// Mail is disabled when `settings.send_email_to` is empty, unless `force`
/// is set. Returns whether a message reached the mailer.
///
/// # Errors
/// - Propagates transport errors from `mailer`.
pub fn send_email(
    mailer: &impl Mailer,
    settings: &ConferenceSettings,
    force: bool,
    draft: MailDraft,
) -> CollaboratorResult<bool> {
    if !force && settings.send_email_to.is_empty() {
        info!("event=mail_send module=integrations status=skipped reason=no_allow_list");
        return Ok(false);
    }

    let message = MailMessage {
        subject: draft.subject,
        body: draft.body,
        from_email: draft
            .from_email
            .unwrap_or_else(|| settings.default_from_email.clone()),
        recipient_list: draft
            .recipient_list
            .unwrap_or_else(|| settings.send_email_to.clone()),
    };
    mailer.send(&message)?;
    info!(
        "event=mail_send module=integrations status=ok recipients={}",
        message.recipient_list.len()
    );
    Ok(true)
}
