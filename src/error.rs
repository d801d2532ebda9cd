//! Defines the app level error type and conversions to rendered HTML pages and action results.
use axum::response::{IntoResponse, Response};

use crate::{
    action::ActionResult, internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as an establishment name.
    #[error("Informe o nome do estabelecimento.")]
    EmptyEstablishmentName,

    /// The establishment ID in the path or the submitted form could not be read.
    #[error("Estabelecimento inválido.")]
    InvalidEstablishmentRequest,

    /// An establishment with the same name, ignoring case and surrounding whitespace, already exists.
    #[error("Já existe um estabelecimento com o nome \"{0}\".")]
    DuplicateEstablishmentName(String),

    /// An empty string was used as a category name.
    #[error("Informe o nome da categoria.")]
    EmptyCategoryName,

    /// A category budget must not be negative.
    #[error("O orçamento não pode ser negativo: {0}")]
    NegativeBudget(f64),

    /// A string could not be parsed as a `YYYY-MM` period.
    #[error("\"{0}\" is not a valid YYYY-MM period")]
    InvalidPeriod(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an establishment that does not exist for the current user.
    #[error("Estabelecimento não encontrado.")]
    DeleteMissingEstablishment,

    /// Tried to delete an establishment whose name is still used by transactions.
    ///
    /// Transactions link to establishments by name, so deleting the record
    /// while transactions still carry the name would orphan them.
    #[error(
        "Não é possível excluir: existem lançamentos vinculados a este estabelecimento. \
        Remova ou altere os lançamentos primeiro."
    )]
    EstablishmentInUse(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Fuso horário inválido",
                fix: &format!(
                    "Não foi possível obter o fuso horário \"{timezone}\". Verifique as \
                    configurações do servidor e use um nome canônico, e.g. America/Sao_Paulo."
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into the failure shape returned by user actions.
    ///
    /// Validation, not-found and integrity errors carry their message to the
    /// user. Anything else is logged and replaced with a generic message.
    pub fn into_action_result(self) -> ActionResult {
        match self {
            Error::EmptyEstablishmentName
            | Error::InvalidEstablishmentRequest
            | Error::DuplicateEstablishmentName(_)
            | Error::EmptyCategoryName
            | Error::NegativeBudget(_)
            | Error::DeleteMissingEstablishment
            | Error::EstablishmentInUse(_) => ActionResult::failure(self.to_string()),
            Error::NotFound => ActionResult::failure("Registro não encontrado."),
            error => {
                tracing::error!("An unexpected error occurred while handling an action: {error}");
                ActionResult::failure(
                    "Ocorreu um erro inesperado. Tente novamente mais tarde.",
                )
            }
        }
    }
}
