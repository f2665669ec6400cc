//! Outbound messaging
//!
//! No real provider is wired in; messages land in the log at info level
//! with their secrets elided. The token flows only ever log the fact of
//! sending, never the raw secret.

use tracing::info;

pub fn send_email(to: &str, subject: &str, body: &str) {
    info!(
        target: "mailer",
        to = %to,
        subject = %subject,
        body_len = body.len(),
        "Email queued"
    );
}

pub fn send_sms(phone: &str, body: &str) {
    info!(
        target: "mailer",
        phone = %phone,
        body_len = body.len(),
        "SMS queued"
    );
}
