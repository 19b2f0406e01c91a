//! Form Controller: turns field edits into a validated, submitted payload.
//!
//! ```text
//! Idle/Failed --edit--> Idle/Failed          (clears that field's error)
//! Idle/Failed --submit--> Validating
//! Validating --invalid--> Failed             (field errors, no network)
//! Validating --valid--> Submitting           (needs an authenticated session)
//! Submitting --ok--> Succeeded               (navigates once)
//! Submitting --err--> Failed
//! ```
//!
//! Submits arriving in `Validating`, `Submitting` or `Succeeded` are ignored, so a form
//! instance has at most one request in flight.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use strum::Display;
use uuid::Uuid;

use crate::{
    config::DEFAULT_SIGN_IN_PATH,
    error::{ApiError, FormError, SchemaError},
    models::{FieldErrors, FieldValue, FieldValues, Identity, Session},
    navigation::Navigator,
    session::SessionStore,
    validation::{FormSchema, NormalizedValues, validate},
};

/// The submit function injected into a form.
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, values: &NormalizedValues, token: &str) -> Result<Value, ApiError>;
}

/// Computes the path to navigate to after a successful submission.
pub type SuccessRoute = Box<dyn Fn(&Identity, &Value) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FormStatus {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// FormState
///
/// Snapshot of everything the presentation layer renders for a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub values: FieldValues,
    /// Per-field messages. Only non-empty in `Idle` or `Failed`.
    pub errors: FieldErrors,
    /// Top-level failure not attributed to a field.
    pub form_error: Option<FormError>,
    pub status: FormStatus,
}

/// What a call to [`FormController::submit`] ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was in flight, the form already succeeded, or it is unmounted.
    Ignored,
    /// Field errors were recorded, locally or by the server.
    Invalid,
    /// A top-level error was recorded.
    Failed(FormError),
    Succeeded,
    /// The request finished after the form was unmounted; its result was dropped.
    Discarded,
}

struct Inner {
    state: FormState,
    mounted: bool,
}

/// FormController
///
/// Owns one mounted form. Share it behind an `Arc` when the submission runs on a
/// separate task; every method takes `&self`.
pub struct FormController {
    id: Uuid,
    schema: FormSchema,
    inner: Mutex<Inner>,
    session: Arc<SessionStore>,
    submitter: Arc<dyn FormSubmitter>,
    navigator: Arc<dyn Navigator>,
    on_success: SuccessRoute,
    sign_in_path: String,
}

impl FormController {
    /// Mounts a form with its schema-declared defaults. Every default must name a
    /// schema field.
    pub fn new(
        schema: FormSchema,
        defaults: FieldValues,
        session: Arc<SessionStore>,
        submitter: Arc<dyn FormSubmitter>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SchemaError> {
        if let Some(name) = defaults.keys().find(|name| !schema.contains(name)) {
            return Err(SchemaError::UndeclaredDefault(name.clone()));
        }

        let id = Uuid::new_v4();
        tracing::debug!(form_id = %id, fields = schema.fields().len(), "form mounted");

        Ok(Self {
            id,
            schema,
            inner: Mutex::new(Inner {
                state: FormState {
                    values: defaults,
                    errors: FieldErrors::new(),
                    form_error: None,
                    status: FormStatus::Idle,
                },
                mounted: true,
            }),
            session,
            submitter,
            navigator,
            on_success: Box::new(|_, _| "/".to_string()),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
        })
    }

    pub fn on_success<F>(mut self, route: F) -> Self
    where
        F: Fn(&Identity, &Value) -> String + Send + Sync + 'static,
    {
        self.on_success = Box::new(route);
        self
    }

    pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> FormState {
        self.inner.lock().state.clone()
    }

    pub fn status(&self) -> FormStatus {
        self.inner.lock().state.status
    }

    pub fn errors(&self) -> FieldErrors {
        self.inner.lock().state.errors.clone()
    }

    pub fn form_error(&self) -> Option<FormError> {
        self.inner.lock().state.form_error.clone()
    }

    pub fn value(&self, name: &str) -> Option<FieldValue> {
        self.inner.lock().state.values.get(name).cloned()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status(), FormStatus::Validating | FormStatus::Submitting)
    }

    /// Binding for a schema field, handed to whatever widget renders it.
    pub fn field(&self, name: &str) -> Option<Field<'_>> {
        self.schema.field(name).map(|f| Field { form: self, name: f.name.clone() })
    }

    /// edit
    ///
    /// Stores a new raw value and clears that field's error. Validation waits until the
    /// next submit. Returns false when the edit was not applied (unknown field, form busy,
    /// already succeeded or unmounted).
    pub fn edit(&self, name: &str, value: FieldValue) -> bool {
        if !self.schema.contains(name) {
            tracing::warn!(form_id = %self.id, field = name, "edit for undeclared field ignored");
            return false;
        }

        let mut inner = self.inner.lock();
        if !inner.mounted || !matches!(inner.state.status, FormStatus::Idle | FormStatus::Failed) {
            return false;
        }

        inner.state.values.insert(name.to_string(), value);
        inner.state.errors.remove(name);
        true
    }

    /// Marks the form as gone. A submission still in flight finishes but its result is
    /// dropped without touching state or navigating.
    pub fn unmount(&self) {
        self.inner.lock().mounted = false;
        tracing::debug!(form_id = %self.id, "form unmounted");
    }

    /// submit
    ///
    /// Runs one pass of the state machine from `Idle`/`Failed` to a resting state.
    pub async fn submit(&self) -> SubmitOutcome {
        // 1. Guard and snapshot
        let snapshot = {
            let mut inner = self.inner.lock();
            if !inner.mounted
                || !matches!(inner.state.status, FormStatus::Idle | FormStatus::Failed)
            {
                tracing::debug!(form_id = %self.id, status = %inner.state.status, "submit ignored");
                return SubmitOutcome::Ignored;
            }
            inner.state.status = FormStatus::Validating;
            inner.state.errors.clear();
            inner.state.form_error = None;
            inner.state.values.clone()
        };

        // 2. Local validation
        let normalized = match validate(&self.schema, &snapshot) {
            Ok(normalized) => normalized,
            Err(errors) => {
                tracing::debug!(form_id = %self.id, invalid = errors.len(), "validation failed");
                self.fail_with_fields(errors);
                return SubmitOutcome::Invalid;
            }
        };

        // 3. Session check
        let Session::Authenticated { token, identity } = self.session.get_state() else {
            tracing::warn!(form_id = %self.id, "submit without an authenticated session");
            return self.fail_with(FormError::NotAuthenticated);
        };

        {
            let mut inner = self.inner.lock();
            inner.state.status = FormStatus::Submitting;
        }
        tracing::info!(form_id = %self.id, uid = %identity.uid, "submitting form");

        // 4. Network call, no lock held
        let result = self.submitter.submit(&normalized, &token).await;

        let mut inner = self.inner.lock();
        if !inner.mounted {
            tracing::debug!(form_id = %self.id, "submission finished after unmount, dropped");
            return SubmitOutcome::Discarded;
        }

        // 5. Resolve
        match result {
            Ok(body) => {
                inner.state.status = FormStatus::Succeeded;
                drop(inner);

                let path = (self.on_success)(&identity, &body);
                tracing::info!(form_id = %self.id, path = %path, "form submitted");
                self.navigator.navigate_to(&path);
                SubmitOutcome::Succeeded
            }
            Err(ApiError::Unauthorized) => {
                inner.state.status = FormStatus::Failed;
                inner.state.form_error = Some(FormError::SessionExpired);
                drop(inner);

                tracing::warn!(form_id = %self.id, "token rejected, signing out");
                self.session.expire();
                self.navigator.navigate_to(&self.sign_in_path);
                SubmitOutcome::Failed(FormError::SessionExpired)
            }
            Err(ApiError::ValidationRejected(fields)) => {
                inner.state.status = FormStatus::Failed;
                inner.state.errors = fields;
                SubmitOutcome::Invalid
            }
            Err(e) => {
                tracing::error!(form_id = %self.id, error = %e, "form submission failed");
                inner.state.status = FormStatus::Failed;
                inner.state.form_error = Some(FormError::Submission);
                SubmitOutcome::Failed(FormError::Submission)
            }
        }
    }

    fn fail_with_fields(&self, errors: FieldErrors) {
        let mut inner = self.inner.lock();
        inner.state.status = FormStatus::Failed;
        inner.state.errors = errors;
    }

    fn fail_with(&self, error: FormError) -> SubmitOutcome {
        let mut inner = self.inner.lock();
        inner.state.status = FormStatus::Failed;
        inner.state.form_error = Some(error.clone());
        SubmitOutcome::Failed(error)
    }
}

/// FieldBinding
///
/// The `{value, onChange}` capability a widget adapter needs. Widgets depend on this
/// trait only, never on the controller.
pub trait FieldBinding {
    fn value(&self) -> Option<FieldValue>;
    fn on_change(&self, value: FieldValue);
}

/// Binding of one schema field of a [`FormController`].
pub struct Field<'a> {
    form: &'a FormController,
    name: String,
}

impl Field<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error(&self) -> Option<String> {
        self.form.inner.lock().state.errors.get(&self.name).cloned()
    }
}

impl FieldBinding for Field<'_> {
    fn value(&self) -> Option<FieldValue> {
        self.form.value(&self.name)
    }

    fn on_change(&self, value: FieldValue) {
        self.form.edit(&self.name, value);
    }
}
