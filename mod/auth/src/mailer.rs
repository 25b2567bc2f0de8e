//! Outbound mail boundary.
//!
//! Mail transport is an external collaborator — the auth service only needs
//! `send`. The host binary wires a real transport; [`LogMailer`] is the dev
//! fallback that just logs the dispatch.

use thiserror::Error;

/// Mail transport failure.
#[derive(Debug, Error)]
#[error("mail transport: {0}")]
pub struct MailError(pub String);

/// Sends a single HTML mail. Raises on transport failure.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

/// Development mailer: logs the dispatch instead of sending.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), MailError> {
        tracing::info!(to, subject, "mail dispatch (log only)");
        Ok(())
    }
}

const RESET_TEMPLATE: &str = r#"<!doctype html>
<html>
  <body style="font-family: sans-serif;">
    <h2>Password recovery</h2>
    <p>We received a request to reset your password. The link below is valid
    for one hour:</p>
    <p><a href="{{resetUrl}}">Reset your password</a></p>
    <p>If you did not request this, you can ignore this message.</p>
    <p style="color: #888;">&copy; {{year}} Wise</p>
  </body>
</html>
"#;

/// Render the reset-password mail body for the given reset link.
pub fn reset_password_body(reset_url: &str) -> String {
    let year = chrono::Utc::now().format("%Y").to_string();
    RESET_TEMPLATE
        .replace("{{resetUrl}}", reset_url)
        .replace("{{year}}", &year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_body_substitution() {
        let body = reset_password_body("https://app.example.com/auth/reset-password?token=abc");
        assert!(body.contains("https://app.example.com/auth/reset-password?token=abc"));
        assert!(!body.contains("{{resetUrl}}"));
        assert!(!body.contains("{{year}}"));
    }
}
