//! Declarative form schemas and the validator that checks raw values against them.
//!
//! [`validate`] is a pure function: same schema and values in, same result out. It is
//! exhaustive, reporting one message for every failing field instead of stopping
//! at the first.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use strum::{Display, EnumString};

use crate::{
    error::SchemaError,
    models::{FieldErrors, FieldValue, FieldValues},
};

pub const REQUIRED_MESSAGE: &str = "required";
pub const INVALID_CHOICE_MESSAGE: &str = "invalid choice";
pub const INVALID_DATE_MESSAGE: &str = "invalid date";

/// Date entry format used by the forms (`yyyy/MM/dd`, the Japanese numeric order).
pub const DATE_FORMAT: &str = "%Y/%m/%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text.
    String,
    /// One of `allowed_values`.
    Enum,
    /// Calendar date, entered as text in [`DATE_FORMAT`].
    Date,
    /// Multi-line text.
    Text,
}

/// FieldSchema
///
/// Validation rule for one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub allowed_values: Option<BTreeSet<String>>,
}

impl FieldSchema {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind, required: false, allowed_values: None }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn one_of<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_values: Some(choices.into_iter().map(Into::into).collect()),
            ..Self::new(name, FieldKind::Enum)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// FormSchema
///
/// Ordered field rules with unique names. Errors are collected in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<FieldSchema>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// NormalizedValues
///
/// Output of a clean validation pass: only schema fields, date fields as real dates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedValues(FieldValues);

impl NormalizedValues {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn values(&self) -> &FieldValues {
        &self.0
    }

    pub fn into_inner(self) -> FieldValues {
        self.0
    }

    /// JSON object body for the API. Dates serialize as ISO `YYYY-MM-DD`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }

    /// Converts into a typed payload struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

/// validate
///
/// Checks `values` against `schema`, field by field in schema order:
/// 1. required and absent/empty: `REQUIRED_MESSAGE`
/// 2. enum with a value outside `allowed_values`: `INVALID_CHOICE_MESSAGE`
/// 3. date given as text that does not parse with [`DATE_FORMAT`]: `INVALID_DATE_MESSAGE`
///
/// Returns every failing field at once, or the normalized values when none fail.
pub fn validate(
    schema: &FormSchema,
    values: &FieldValues,
) -> Result<NormalizedValues, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut normalized = FieldValues::new();

    for field in schema.fields() {
        let value = values.get(&field.name).filter(|v| !v.is_empty());

        let Some(value) = value else {
            if field.required {
                errors.insert(field.name.clone(), REQUIRED_MESSAGE.to_string());
            } else if let Some(empty) = values.get(&field.name) {
                // Optional free text keeps its empty answer; typed fields are just omitted.
                if matches!(field.kind, FieldKind::String | FieldKind::Text) {
                    normalized.insert(field.name.clone(), empty.clone());
                }
            }
            continue;
        };

        match check_field(field, value) {
            Ok(v) => {
                normalized.insert(field.name.clone(), v);
            }
            Err(message) => {
                errors.insert(field.name.clone(), message.to_string());
            }
        }
    }

    if errors.is_empty() {
        Ok(NormalizedValues(normalized))
    } else {
        Err(errors)
    }
}

fn check_field(field: &FieldSchema, value: &FieldValue) -> Result<FieldValue, &'static str> {
    match field.kind {
        FieldKind::String | FieldKind::Text => Ok(value.clone()),
        FieldKind::Enum => {
            let allowed = field.allowed_values.as_ref();
            match value.as_text() {
                Some(choice) if allowed.is_some_and(|set| set.contains(choice)) => {
                    Ok(value.clone())
                }
                _ => Err(INVALID_CHOICE_MESSAGE),
            }
        }
        FieldKind::Date => match value {
            FieldValue::Date(_) => Ok(value.clone()),
            FieldValue::Text(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(FieldValue::Date)
                .map_err(|_| INVALID_DATE_MESSAGE),
        },
    }
}
