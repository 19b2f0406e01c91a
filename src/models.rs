use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use ts_rs::TS;

// --- Session Schemas ---

/// Identity
///
/// The signed-in user as reported by the identity provider. `display_name` is also the
/// user's public page slug (`/{display_name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Identity {
    pub display_name: String,
    pub uid: String,
}

/// Credential
///
/// What a successful identity-provider resolution yields: a bearer token for the API and
/// the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub identity: Identity,
}

/// SessionState
///
/// The coarse state of a [`Session`], without its payload. Used for logging and for the
/// Auth Gate truth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Session
///
/// The process-wide authentication state. Token and identity only exist inside the
/// `Authenticated` variant, so a session holding exactly one of them cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Initial state until the identity provider has resolved once.
    #[default]
    Unknown,
    Authenticated {
        token: String,
        identity: Identity,
    },
    Unauthenticated,
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self {
            Session::Unknown => SessionState::Unknown,
            Session::Authenticated { .. } => SessionState::Authenticated,
            Session::Unauthenticated => SessionState::Unauthenticated,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

impl From<Credential> for Session {
    fn from(credential: Credential) -> Self {
        Session::Authenticated {
            token: credential.token,
            identity: credential.identity,
        }
    }
}

// --- Page Composition Schemas ---

/// LayoutId
///
/// Structural shell a page is wrapped in. Parsed from its lowercase name; the Layout
/// Registry maps unrecognised names to `Standard`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[ts(export)]
pub enum LayoutId {
    Dashboard,
    Standard,
    /// The page is rendered without any surrounding chrome.
    #[default]
    None,
}

/// PageDeclaration
///
/// Static metadata registered for every page at startup and read by the Auth Gate.
/// The default (public page, no layout) is what an undeclared page gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageDeclaration {
    pub needs_authentication: bool,
    pub layout: LayoutId,
}

impl PageDeclaration {
    pub const fn public(layout: LayoutId) -> Self {
        Self { needs_authentication: false, layout }
    }

    pub const fn protected(layout: LayoutId) -> Self {
        Self { needs_authentication: true, layout }
    }
}

// --- Form Values ---

/// FieldValue
///
/// A raw or normalized form value. Widgets produce `Text`; the validator turns date-kind
/// text into `Date`. A field that is absent from the value mapping is "undefined".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty means "no answer": the empty string. Dates are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Date(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Raw field values keyed by field name.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// Per-field error messages keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

// --- Request Payloads ---

/// Gender
///
/// Choices offered by the requester registration form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[ts(export)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// RequesterInfo
///
/// Payload for registering as a requester (POST /requesters). Built from the normalized
/// values of the requester form, so `birth_date` is already a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RequesterInfo {
    pub realm: String,
    pub gender: Gender,
    pub organization: String,
    pub url: String,
    #[ts(type = "string")]
    pub birth_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn session_accessors_follow_variant() {
        let session = Session::from(Credential {
            token: "t1".into(),
            identity: Identity { display_name: "alice".into(), uid: "u1".into() },
        });
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(session.identity().map(|i| i.display_name.as_str()), Some("alice"));

        for other in [Session::Unknown, Session::Unauthenticated] {
            assert!(other.token().is_none());
            assert!(other.identity().is_none());
        }
    }

    #[test]
    fn layout_id_parses_lowercase_names() {
        assert_eq!(LayoutId::from_str("dashboard"), Ok(LayoutId::Dashboard));
        assert_eq!(LayoutId::from_str("none"), Ok(LayoutId::None));
        assert!(LayoutId::from_str("sidebar").is_err());
        assert_eq!(LayoutId::Standard.to_string(), "standard");
    }

    #[test]
    fn requester_info_uses_camel_case_keys() {
        let info = RequesterInfo {
            realm: "Taro".into(),
            gender: Gender::Other,
            organization: "Univ".into(),
            url: "https://example.com".into(),
            birth_date: NaiveDate::from_ymd_opt(1999, 4, 1).unwrap(),
            introduction: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains(r#""birthDate":"1999-04-01""#));
        assert!(json.contains(r#""gender":"other""#));
        assert!(!json.contains("introduction"));
    }
}
