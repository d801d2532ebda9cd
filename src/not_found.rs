//! The page to display when a route or record does not exist.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Renders the 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            error_view(
                "Página não encontrada",
                "404",
                "Página não encontrada",
                "Verifique o endereço ou volte para a página inicial.",
            ),
        )
            .into_response()
    }
}

/// The fallback handler for unknown routes.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
