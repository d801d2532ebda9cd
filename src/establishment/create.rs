//! Establishment creation.

use axum::{
    Extension, Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::Response,
};
use axum_htmx::HxRequest;
use rusqlite::Connection;

use crate::{
    Error, UserId,
    action::respond,
    establishment::{
        EstablishmentFormData, EstablishmentName, EstablishmentState,
        db::{create_establishment, get_establishments},
        reconcile::normalize_name_key,
    },
};

/// Create an establishment from the submitted form.
///
/// Returns the message to show the user on success.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyEstablishmentName] if the name is blank,
/// - [Error::DuplicateEstablishmentName] if `user_id` already has an establishment with the same
///   name, ignoring case and surrounding whitespace,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_establishment_action(
    user_id: UserId,
    form: &EstablishmentFormData,
    connection: &Connection,
) -> Result<String, Error> {
    let name = EstablishmentName::new(&form.name)?;

    let key = normalize_name_key(name.as_ref());
    if let Some(existing) = get_establishments(user_id, connection)?
        .into_iter()
        .find(|establishment| normalize_name_key(&establishment.name) == key)
    {
        return Err(Error::DuplicateEstablishmentName(existing.name));
    }

    let establishment = create_establishment(user_id, name, connection)?;

    tracing::debug!("created establishment {}", establishment.id);

    Ok("Estabelecimento criado com sucesso.".to_owned())
}

/// Handle establishment creation form submissions.
///
/// Always responds with an action result, see [crate::ActionResult].
/// A body that is not a form is rejected as [Error::InvalidEstablishmentRequest].
pub async fn create_establishment_endpoint(
    State(state): State<EstablishmentState>,
    HxRequest(is_htmx): HxRequest,
    Extension(user_id): Extension<UserId>,
    form: Result<Form<EstablishmentFormData>, FormRejection>,
) -> Response {
    let outcome = form
        .inspect_err(|rejection| tracing::info!("rejected establishment form: {rejection}"))
        .map_err(|_| Error::InvalidEstablishmentRequest)
        .and_then(|Form(form)| {
            state
                .db_connection
                .lock()
                .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
                .map_err(|_| Error::DatabaseLockError)
                .and_then(|connection| create_establishment_action(user_id, &form, &connection))
        });

    respond(outcome, StatusCode::CREATED, is_htmx)
}
