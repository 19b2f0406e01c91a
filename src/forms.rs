//! Registration forms offered by the application.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    api::{ApiState, TypedSubmitter},
    error::SchemaError,
    form::FormController,
    models::{FieldValue, FieldValues, Gender, RequesterInfo},
    navigation::Navigator,
    session::SessionStore,
    validation::{FieldSchema, FormSchema},
};

// --- Requester Registration ---

pub const REQUESTERS_ENDPOINT: &str = "/requesters";

/// requester_info_schema
///
/// Everything but the self-introduction is mandatory; the birth date is typed as
/// `yyyy/MM/dd`.
pub fn requester_info_schema() -> Result<FormSchema, SchemaError> {
    FormSchema::new(vec![
        FieldSchema::string("realm").required(),
        FieldSchema::one_of("gender", Gender::iter().map(|g| g.to_string())).required(),
        FieldSchema::string("organization").required(),
        FieldSchema::string("url").required(),
        FieldSchema::date("birthDate").required(),
        FieldSchema::text("introduction"),
    ])
}

pub fn requester_info_defaults() -> FieldValues {
    let mut defaults: FieldValues = ["realm", "organization", "url", "birthDate", "introduction"]
        .into_iter()
        .map(|name| (name.to_string(), FieldValue::text("")))
        .collect();
    defaults.insert("gender".to_string(), FieldValue::text(Gender::Male.to_string()));
    defaults
}

/// requester_info_form
///
/// Mounts the requester registration form. It posts a [`RequesterInfo`] to `/requesters`
/// and, once registered, sends the user to their own page `/{display_name}`.
pub fn requester_info_form(
    session: Arc<SessionStore>,
    api: ApiState,
    navigator: Arc<dyn Navigator>,
    sign_in_path: &str,
) -> Result<FormController, SchemaError> {
    let submitter = Arc::new(TypedSubmitter::<RequesterInfo>::new(api, REQUESTERS_ENDPOINT));

    Ok(FormController::new(
        requester_info_schema()?,
        requester_info_defaults(),
        session,
        submitter,
        navigator,
    )?
    .sign_in_path(sign_in_path)
    .on_success(|identity, _| format!("/{}", identity.display_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{REQUIRED_MESSAGE, validate};
    use chrono::NaiveDate;

    #[test]
    fn defaults_fail_on_every_required_text_field() {
        let errors =
            validate(&requester_info_schema().unwrap(), &requester_info_defaults()).unwrap_err();
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["birthDate", "organization", "realm", "url"]);
        assert!(errors.values().all(|m| m == REQUIRED_MESSAGE));
    }

    #[test]
    fn completed_form_converts_to_payload() {
        let mut values = requester_info_defaults();
        for (name, value) in [
            ("realm", "Yamada Taro"),
            ("gender", "female"),
            ("organization", "Lavlus Univ."),
            ("url", "https://example.com"),
            ("birthDate", "1998/07/15"),
            ("introduction", "Hello"),
        ] {
            values.insert(name.to_string(), FieldValue::text(value));
        }

        let normalized = validate(&requester_info_schema().unwrap(), &values).unwrap();
        let info: RequesterInfo = normalized.deserialize().unwrap();

        assert_eq!(info.gender, Gender::Female);
        assert_eq!(info.birth_date, NaiveDate::from_ymd_opt(1998, 7, 15).unwrap());
        assert_eq!(info.introduction.as_deref(), Some("Hello"));
    }
}
