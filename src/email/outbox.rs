// src/email/outbox.rs
use chrono::{DateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use crate::email::DeliveryMode;
use crate::error::{Error, Result};

/// A composed message ready to hand to a mail client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Header values must stay on one line.
fn header_value(v: &str) -> String {
    v.replace(['\r', '\n'], " ")
}

impl OutgoingMail {
    /// RFC 5322 message with a single HTML part. Drafts carry `X-Unsent: 1`
    /// so mail programs open them for editing.
    pub fn to_eml(&self, date: DateTime<Utc>, mode: DeliveryMode) -> String {
        let mut out = String::new();
        out.push_str(&format!("From: {}\r\n", header_value(&self.from)));
        out.push_str(&format!("To: {}\r\n", header_value(&self.to)));
        out.push_str(&format!("Subject: {}\r\n", header_value(&self.subject)));
        out.push_str(&format!("Date: {}\r\n", date.to_rfc2822()));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str("Content-Type: text/html; charset=utf-8\r\n");
        out.push_str("Content-Transfer-Encoding: 8bit\r\n");
        if mode == DeliveryMode::Display {
            out.push_str("X-Unsent: 1\r\n");
        }
        out.push_str("\r\n");
        for line in self.html_body.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }
}

/// Where composed mails go.
pub trait MailClient {
    fn deliver(&mut self, mail: &OutgoingMail, mode: DeliveryMode) -> Result<()>;
}

/// File-based mail client: every message becomes an `.eml` file in
/// `<root>/drafts` or `<root>/sent`.
#[derive(Debug)]
pub struct OutboxClient {
    root: PathBuf,
    written: usize,
}

impl OutboxClient {
    /// Open (creating if needed) the outbox. Failure here aborts a compose run.
    #[instrument(level = "info", fields(dir = %dir.as_ref().display()), skip(dir))]
    pub fn connect<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        for sub in ["drafts", "sent"] {
            fs::create_dir_all(root.join(sub)).map_err(|e| {
                Error::MailClient(format!(
                    "cannot open outbox {}: {}",
                    root.display(),
                    e
                ))
            })?;
        }
        Ok(Self { root, written: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, mode: DeliveryMode) -> PathBuf {
        match mode {
            DeliveryMode::Display => self.root.join("drafts"),
            DeliveryMode::Send => self.root.join("sent"),
        }
    }

    /// Messages written through this client so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

fn file_stem(to: &str) -> String {
    to.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

impl MailClient for OutboxClient {
    fn deliver(&mut self, mail: &OutgoingMail, mode: DeliveryMode) -> Result<()> {
        let now = Utc::now();
        let name = format!(
            "{}-{:04}-{}.eml",
            now.format("%Y%m%dT%H%M%S"),
            self.written + 1,
            file_stem(&mail.to)
        );
        let path = self.dir_for(mode).join(name);
        fs::write(&path, mail.to_eml(now, mode))
            .map_err(|e| Error::MailClient(format!("writing {}: {}", path.display(), e)))?;
        self.written += 1;
        debug!(path = %path.display(), "mail written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            from: "team@example.com".into(),
            to: "jane@example.com".into(),
            subject: "Report\r\nBcc: evil@example.com".into(),
            html_body: "<html>\n<body>hi</body>\n</html>".into(),
        }
    }

    #[test]
    fn eml_headers_and_body() {
        let date = Utc.with_ymd_and_hms(2025, 8, 4, 9, 30, 0).unwrap();
        let eml = mail().to_eml(date, DeliveryMode::Display);
        assert!(eml.starts_with("From: team@example.com\r\nTo: jane@example.com\r\n"));
        assert!(eml.contains("Subject: Report  Bcc: evil@example.com\r\n"));
        assert!(eml.contains("Aug 2025 09:30:00 +0000\r\n"));
        assert!(eml.contains("X-Unsent: 1\r\n"));
        assert!(eml.ends_with("\r\n\r\n<html>\r\n<body>hi</body>\r\n</html>\r\n"));

        let sent = mail().to_eml(date, DeliveryMode::Send);
        assert!(!sent.contains("X-Unsent"));
    }

    #[test]
    fn outbox_routes_by_mode() -> Result<()> {
        let dir = tempdir()?;
        let mut client = OutboxClient::connect(dir.path().join("outbox"))?;
        client.deliver(&mail(), DeliveryMode::Display)?;
        client.deliver(&mail(), DeliveryMode::Send)?;
        client.deliver(&mail(), DeliveryMode::Send)?;
        assert_eq!(client.written(), 3);

        let count = |p: PathBuf| fs::read_dir(p).map(|d| d.count()).unwrap_or(0);
        assert_eq!(count(client.dir_for(DeliveryMode::Display)), 1);
        assert_eq!(count(client.dir_for(DeliveryMode::Send)), 2);
        Ok(())
    }

    #[test]
    fn connect_failure_is_mail_client_error() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"x")?;
        let err = OutboxClient::connect(&blocker).unwrap_err();
        assert!(matches!(err, Error::MailClient(_)));
        Ok(())
    }
}
