use std::{collections::BTreeMap, convert::Infallible, fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::repo_types::Account;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// Selects which field rules apply to an account payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationAction {
    #[default]
    Signup,
    Login,
    Update,
    ForgotPassword,
}

impl FromStr for ValidationAction {
    type Err = Infallible;

    /// Case-insensitive; anything unrecognized gets the full signup rules.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "login" => ValidationAction::Login,
            "update" => ValidationAction::Update,
            "forgotpassword" => ValidationAction::ForgotPassword,
            _ => ValidationAction::Signup,
        })
    }
}

impl From<&str> for ValidationAction {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

/// Field errors keyed by `required_<field>` / `invalid_<field>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, &'static str>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&'static str> {
        self.0.get(code).copied()
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn add(&mut self, code: &'static str, message: &'static str) {
        self.0.insert(code, message);
    }

    /// `Ok(())` when no rule failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (code, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{code}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(concat!(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+",
            r"@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        ))
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl Account {
    /// Runs every rule for `action` and collects all failures. `username` and
    /// `email` are checked as `prepare` will store them, i.e. trimmed.
    pub fn validate(&self, action: ValidationAction) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        let username = self.username.trim();
        let email = self.email.trim();

        match action {
            ValidationAction::Signup => {
                if username.is_empty() {
                    errors.add("required_username", "required username");
                }
                if self.password.is_empty() {
                    errors.add("required_password", "required password");
                } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
                    errors.add(
                        "invalid_password",
                        "password should be at least 6 characters",
                    );
                }
            }
            ValidationAction::Login => {
                if self.password.is_empty() {
                    errors.add("required_password", "required password");
                }
            }
            ValidationAction::Update | ValidationAction::ForgotPassword => {}
        }

        if email.is_empty() {
            errors.add("required_email", "required email");
        } else if !is_valid_email(email) {
            errors.add("invalid_email", "invalid email");
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, email: &str, password: &str) -> Account {
        Account {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..Account::default()
        }
    }

    #[test]
    fn action_parsing_is_case_insensitive() {
        assert_eq!(ValidationAction::from("LOGIN"), ValidationAction::Login);
        assert_eq!(ValidationAction::from("Update"), ValidationAction::Update);
        assert_eq!(
            ValidationAction::from("ForgotPassword"),
            ValidationAction::ForgotPassword
        );
        assert_eq!(ValidationAction::from("signup"), ValidationAction::Signup);
        assert_eq!(ValidationAction::from("whatever"), ValidationAction::Signup);
        assert_eq!(ValidationAction::from(""), ValidationAction::Signup);
    }

    #[test]
    fn signup_on_empty_account_reports_three_required_fields() {
        let errors = account("", "", "").validate(ValidationAction::Signup);
        let codes: Vec<_> = errors.codes().collect();
        assert_eq!(
            codes,
            vec!["required_email", "required_password", "required_username"]
        );
    }

    #[test]
    fn signup_password_length_boundary() {
        let short =
            account("alice", "alice@example.com", "12345").validate(ValidationAction::Signup);
        assert!(short.contains("invalid_password"));
        assert_eq!(short.len(), 1);

        let ok =
            account("alice", "alice@example.com", "123456").validate(ValidationAction::Signup);
        assert!(ok.is_empty());
    }

    #[test]
    fn password_length_counts_characters() {
        let errors =
            account("bob", "bob@example.com", "ééééé").validate(ValidationAction::Signup);
        assert!(errors.contains("invalid_password"));
        let errors =
            account("bob", "bob@example.com", "éééééé").validate(ValidationAction::Signup);
        assert!(errors.is_empty());
    }

    #[test]
    fn signup_collects_every_failure() {
        let errors = account("", "not-an-email", "abc").validate(ValidationAction::Signup);
        assert!(errors.contains("required_username"));
        assert!(errors.contains("invalid_password"));
        assert!(errors.contains("invalid_email"));
        assert!(!errors.contains("required_email"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn login_never_checks_username_or_password_length() {
        let errors = account("", "alice@example.com", "abc").validate(ValidationAction::Login);
        assert!(errors.is_empty());

        let errors = account("", "", "").validate(ValidationAction::Login);
        assert!(!errors.contains("required_username"));
        assert!(!errors.contains("invalid_password"));
        assert!(errors.contains("required_password"));
        assert!(errors.contains("required_email"));
    }

    #[test]
    fn update_only_checks_email() {
        let errors = account("", "", "").validate(ValidationAction::Update);
        assert_eq!(errors.codes().collect::<Vec<_>>(), vec!["required_email"]);

        let errors = account("", "bad@", "").validate(ValidationAction::Update);
        assert_eq!(errors.codes().collect::<Vec<_>>(), vec!["invalid_email"]);
    }

    #[test]
    fn forgot_password_reports_missing_email_as_email() {
        let errors = account("", "", "").validate(ValidationAction::ForgotPassword);
        assert_eq!(errors.get("required_email"), Some("required email"));
        assert!(!errors.contains("required_password"));

        let errors =
            account("", "alice@example.com", "").validate(ValidationAction::ForgotPassword);
        assert!(errors.is_empty());
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let errors = account("   ", " \t", "secret1").validate(ValidationAction::Signup);
        assert_eq!(
            errors.codes().collect::<Vec<_>>(),
            vec!["required_email", "required_username"]
        );
    }

    #[test]
    fn email_is_checked_after_trimming() {
        let errors =
            account(" bob ", " bob@example.com ", "hunter22").validate(ValidationAction::Signup);
        assert!(errors.is_empty());
        let errors = account("", " bob@example.com\n", "").validate(ValidationAction::Update);
        assert!(errors.is_empty());
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(is_valid_email("user@localhost"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("alice@-example.com"));
    }

    #[test]
    fn errors_serialize_as_json_object() {
        let errors = account("", "", "").validate(ValidationAction::Login);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["required_email"], "required email");
        assert_eq!(json["required_password"], "required password");
        assert!(errors.to_string().contains("required_email: required email"));
        assert!(errors.into_result().is_err());
    }
}
