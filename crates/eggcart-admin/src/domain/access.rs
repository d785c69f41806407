//! Who may open the order console.

/// Operator email allow-list.
///
/// Addresses compare case-insensitively and ignore surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAccess {
    emails: Vec<String>,
}

impl AdminAccess {
    /// Environment variable holding the comma-separated allow-list.
    pub const ENV_VAR: &'static str = "ADMIN_EMAILS";

    /// Builds an allow-list from individual addresses. Blank entries are
    /// skipped.
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|email| email.as_ref().trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();
        Self { emails }
    }

    /// Reads `ADMIN_EMAILS` through `lookup`. An unset variable admits
    /// nobody.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        lookup(Self::ENV_VAR)
            .map(|raw| Self::new(raw.split(',')))
            .unwrap_or_default()
    }

    /// Reads `ADMIN_EMAILS` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Whether `email` is on the list.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty() && self.emails.contains(&email)
    }
}
