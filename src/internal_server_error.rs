//! The page to display for an internal server error.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Renders the 500 page with a description of the problem and a suggested fix.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Desculpe, algo deu errado.",
            fix: "Tente novamente mais tarde ou verifique os logs do servidor.",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_view("Erro interno", "500", self.description, self.fix),
        )
            .into_response()
    }
}
