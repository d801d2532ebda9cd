//! The uniform result shape for user actions (create, delete, ...).
//!
//! Actions never let an error escape to the client. They always answer with
//! either `{ "success": true, "message": ... }` or
//! `{ "success": false, "error": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::{Error, alert::Alert};

/// The outcome of a user action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// The action completed.
    Success {
        /// A message for the user describing what happened.
        message: String,
    },
    /// The action was rejected or failed.
    Failure {
        /// A message for the user describing why the action failed.
        error: String,
    },
}

impl ActionResult {
    /// Create a successful result.
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    /// Create a failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Build the HTTP response for this result.
    ///
    /// HTMX requests get an alert fragment (and a page refresh on success),
    /// everything else gets JSON.
    pub(crate) fn into_response_for(self, status_code: StatusCode, is_htmx: bool) -> Response {
        if !is_htmx {
            return (status_code, Json(self)).into_response();
        }

        match self {
            ActionResult::Success { message } => (
                status_code,
                HxRefresh(true),
                Alert::SuccessSimple { message }.into_html(),
            )
                .into_response(),
            ActionResult::Failure { error } => (
                status_code,
                Alert::ErrorSimple { message: error }.into_html(),
            )
                .into_response(),
        }
    }
}

impl Serialize for ActionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActionResult", 2)?;

        match self {
            ActionResult::Success { message } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("message", message)?;
            }
            ActionResult::Failure { error } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }

        state.end()
    }
}

/// The HTTP status code that accompanies a failed action caused by `error`.
pub(crate) fn failure_status_code(error: &Error) -> StatusCode {
    match error {
        Error::EmptyEstablishmentName
        | Error::InvalidEstablishmentRequest
        | Error::DuplicateEstablishmentName(_)
        | Error::EmptyCategoryName
        | Error::NegativeBudget(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound | Error::DeleteMissingEstablishment => StatusCode::NOT_FOUND,
        Error::EstablishmentInUse(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert the outcome of an action into a response.
pub(crate) fn respond(
    outcome: Result<String, Error>,
    success_status: StatusCode,
    is_htmx: bool,
) -> Response {
    match outcome {
        Ok(message) => ActionResult::success(message).into_response_for(success_status, is_htmx),
        Err(error) => {
            let status_code = failure_status_code(&error);
            error
                .into_action_result()
                .into_response_for(status_code, is_htmx)
        }
    }
}
