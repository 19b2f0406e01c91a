//! Client application shell for Lavlus.
//!
//! Two mechanisms carry the logic of the client:
//! - the **Auth Gate** ([`gate`], [`app`]): decides for every navigated page whether to
//!   render it (and in which layout), redirect to sign-in, or show a placeholder while the
//!   session is still unknown;
//! - the **form workflow** ([`validation`], [`form`]): schema-driven validation, an
//!   authenticated submission through the API adapter, and navigation on success.
//!
//! Everything external (identity provider, HTTP API, navigation) sits behind a trait so
//! tests can drive the shell without a network.

// --- Module Structure ---

// Shared types and configuration.
pub mod config;
pub mod error;
pub mod models;
pub mod telemetry;

// External collaborator seams.
pub mod api;
pub mod identity;
pub mod navigation;

// Core.
pub mod form;
pub mod gate;
pub mod layout;
pub mod session;
pub mod validation;

// Composition and the concrete application forms.
pub mod app;
pub mod forms;

// --- Public Re-exports ---

pub use app::{AppShell, Screen};
pub use config::{AppConfig, Env};
pub use error::{ApiError, AuthError, FormError, SchemaError};
pub use form::{FormController, FormStatus, SubmitOutcome};
pub use gate::{GateAction, decide};
pub use session::SessionStore;
pub use validation::validate;
