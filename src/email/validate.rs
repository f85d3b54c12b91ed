use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Basic shape check on an address; no DNS or mailbox verification.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
