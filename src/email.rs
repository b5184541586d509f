// Email handling shared by the CLI entry point and the API client. Both
// must reject the same inputs, so the check lives in one place.

use crate::error::{Error, Result};

/// Basic syntactic check: `local-part@domain` where the domain contains a
/// dot that is neither its first nor its last character. No whitespace.
pub fn is_valid(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.find('.') {
        Some(idx) => idx > 0 && !domain.ends_with('.'),
        None => false,
    }
}

/// Trim, validate and lowercase an email. The remote lookup is
/// case-insensitive on this field, so the lowercased form is what we send.
pub fn normalize(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if !is_valid(trimmed) {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a valid email address (expected local-part@domain.tld)",
            email
        )));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid("jane@example.com"));
        assert!(is_valid("jane.doe+ops@mail.example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "janeexample.com", "jane@example", "@example.com", "jane@.com", "jane@example.", "ja ne@example.com", "a@b@c.com"] {
            assert!(!is_valid(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Foo@Bar.COM  ").unwrap(), "foo@bar.com");
    }

    #[test]
    fn normalize_rejects_with_invalid_input() {
        let err = normalize("   ").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
