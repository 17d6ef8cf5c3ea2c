//! Session Entry
//!
//! Registry entries are stored as `"{fingerprint}::{refresh_token}"`.

use platform::crypto::constant_time_eq;

pub const SEPARATOR: &str = "::";

/// Borrowed view of one stored registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEntry<'a> {
    pub fingerprint: &'a str,
    pub refresh_token: &'a str,
}

impl<'a> SessionEntry<'a> {
    pub fn new(fingerprint: &'a str, refresh_token: &'a str) -> Self {
        Self {
            fingerprint,
            refresh_token,
        }
    }

    /// Split on the first separator; entries without one are malformed.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (fingerprint, refresh_token) = raw.split_once(SEPARATOR)?;
        Some(Self::new(fingerprint, refresh_token))
    }

    pub fn encode(&self) -> String {
        format!("{}{}{}", self.fingerprint, SEPARATOR, self.refresh_token)
    }

    /// Both fields must match (constant time per field).
    pub fn matches(&self, fingerprint: &str, refresh_token: &str) -> bool {
        let fp_ok = constant_time_eq(self.fingerprint.as_bytes(), fingerprint.as_bytes());
        let token_ok = self.matches_token(refresh_token);
        fp_ok & token_ok
    }

    pub fn matches_token(&self, refresh_token: &str) -> bool {
        constant_time_eq(self.refresh_token.as_bytes(), refresh_token.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_and_parse() {
        let raw = SessionEntry::new("phone", "aaa.bbb.ccc").encode();
        assert_eq!(raw, "phone::aaa.bbb.ccc");

        let entry = SessionEntry::parse(&raw).unwrap();
        assert_eq!(entry.fingerprint, "phone");
        assert_eq!(entry.refresh_token, "aaa.bbb.ccc");
    }

    #[test]
    fn test_parse_splits_at_first_separator() {
        let entry = SessionEntry::parse("fp::tok::tail").unwrap();
        assert_eq!(entry.fingerprint, "fp");
        assert_eq!(entry.refresh_token, "tok::tail");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(SessionEntry::parse("no-separator").is_none());
        assert_eq!(
            SessionEntry::parse("::tok"),
            Some(SessionEntry::new("", "tok"))
        );
    }

    #[test]
    fn test_matching() {
        let entry = SessionEntry::new("laptop", "t1");
        assert!(entry.matches("laptop", "t1"));
        assert!(!entry.matches("phone", "t1"));
        assert!(!entry.matches("laptop", "t2"));
        assert!(entry.matches_token("t1"));
        assert!(!entry.matches_token("t10"));
    }
}
