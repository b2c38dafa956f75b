//! Validated email values

use std::fmt;

use lettre::Address;

use super::errors::ValidationError;

/// Longest accepted subject, in characters, matching the header line-length
/// convention from RFC 5322.
pub const SUBJECT_MAX_CHARS: usize = 78;

/// A validated email address with an optional display name.
///
/// The address component must parse as a bare RFC 5322 mailbox
/// (`user@example.com`); display-name syntax belongs in `name`, which is
/// stored verbatim and may be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailAddress {
    name: String,
    address: String,
}

impl EmailAddress {
    /// Validate `address` and create a new email address
    pub fn new(name: &str, address: &str) -> Result<Self, ValidationError> {
        address
            .parse::<Address>()
            .map_err(|_| ValidationError::InvalidAddress(address.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            address: address.to_string(),
        })
    }

    /// The display name, possibly empty
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mailbox address
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// A validated subject line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject(String);

impl Subject {
    /// Create a new subject.
    ///
    /// The length limit is measured in characters, not bytes, so multibyte
    /// subjects are not cut short.
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        if text.is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        if text.chars().count() > SUBJECT_MAX_CHARS {
            return Err(ValidationError::SubjectTooLong);
        }

        Ok(Self(text.to_string()))
    }

    /// The subject text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An HTML alternative for a message body.
///
/// Construction never fails. A message without an HTML alternative carries
/// `None` instead of an empty `HtmlBody`, so providers can omit the part
/// entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlBody(String);

impl HtmlBody {
    /// Wrap HTML content
    pub fn new(text: &str) -> Self {
        Self(text.to_string())
    }

    /// The HTML content
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A composed email message.
///
/// Built once per request after every field validated, handed to the
/// delivery strategy, then dropped.
#[derive(Clone, Debug)]
pub struct Email {
    /// The sender
    pub from: EmailAddress,

    /// Primary recipients; intake validation guarantees at least one
    pub to: Vec<EmailAddress>,

    /// Carbon-copy recipients
    pub cc: Vec<EmailAddress>,

    /// Blind-carbon-copy recipients
    pub bcc: Vec<EmailAddress>,

    /// The subject line
    pub subject: Subject,

    /// The plain text body
    pub body: String,

    /// The HTML alternative, if any
    pub html: Option<HtmlBody>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_email_address_accessors() -> TestResult {
        let address = EmailAddress::new("Jo Doe", "jo@example.com")?;

        assert_eq!(address.name(), "Jo Doe");
        assert_eq!(address.address(), "jo@example.com");

        Ok(())
    }

    #[test]
    fn test_email_address_display() -> TestResult {
        let named = EmailAddress::new("Jo Doe", "jo@example.com")?;
        let bare = EmailAddress::new("", "jo@example.com")?;

        assert_eq!(named.to_string(), "Jo Doe <jo@example.com>");
        assert_eq!(bare.to_string(), "jo@example.com");

        Ok(())
    }

    #[test]
    fn test_empty_name_is_accepted() {
        assert!(EmailAddress::new("", "jo@example.com").is_ok());
    }

    #[test]
    fn test_invalid_addresses_are_rejected() {
        for raw in ["", "no-at-sign", "user@", "@example.com", "a b@example.com"] {
            let result = EmailAddress::new("Jo", raw);

            assert!(
                matches!(result, Err(ValidationError::InvalidAddress(_))),
                "{raw:?} should not validate"
            );
        }
    }

    #[test]
    fn test_subject_must_not_be_empty() {
        assert_eq!(Subject::new(""), Err(ValidationError::EmptySubject));
    }

    #[test]
    fn test_subject_boundaries() -> TestResult {
        assert!(Subject::new("a").is_ok());
        assert!(Subject::new(&"a".repeat(SUBJECT_MAX_CHARS)).is_ok());

        assert_eq!(
            Subject::new(&"a".repeat(SUBJECT_MAX_CHARS + 1)),
            Err(ValidationError::SubjectTooLong)
        );

        Ok(())
    }

    #[test]
    fn test_subject_length_counts_characters_not_bytes() {
        // 78 characters but 156 bytes
        let subject = "ä".repeat(SUBJECT_MAX_CHARS);

        assert!(Subject::new(&subject).is_ok());
    }

    #[test]
    fn test_subject_is_stored_verbatim() -> TestResult {
        let subject = Subject::new("  spaced out  ")?;

        assert_eq!(subject.as_str(), "  spaced out  ");

        Ok(())
    }

    #[test]
    fn test_html_body_wraps_content() {
        let body = HtmlBody::new("<p>hello</p>");

        assert_eq!(body.as_str(), "<p>hello</p>");
    }
}
