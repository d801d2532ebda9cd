//! Establishment deletion.
//!
//! Transactions refer to establishments by name, so an establishment can only
//! be deleted once no transaction carries its name.

use axum::{
    Extension,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::Response,
};
use axum_htmx::HxRequest;
use rusqlite::Connection;

use crate::{
    Error, UserId,
    action::respond,
    database_id::DatabaseId,
    establishment::{
        EstablishmentState,
        db::{count_transactions_by_name, delete_establishment, get_establishment},
        reconcile::normalize_name_key,
    },
};

/// Delete an establishment unless transactions still use its name.
///
/// Returns the message to show the user on success.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingEstablishment] if `establishment_id` does not refer to an establishment of `user_id`,
/// - [Error::EstablishmentInUse] if a transaction has the same name, ignoring case and surrounding whitespace,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_establishment_action(
    user_id: UserId,
    establishment_id: DatabaseId,
    connection: &Connection,
) -> Result<String, Error> {
    let establishment = match get_establishment(user_id, establishment_id, connection) {
        Ok(establishment) => establishment,
        Err(Error::NotFound) => return Err(Error::DeleteMissingEstablishment),
        Err(error) => return Err(error),
    };

    if let Some(key) = normalize_name_key(&establishment.name) {
        let is_linked = count_transactions_by_name(user_id, connection)?
            .iter()
            .any(|(name, count)| *count > 0 && normalize_name_key(name).as_ref() == Some(&key));

        if is_linked {
            return Err(Error::EstablishmentInUse(establishment.name));
        }
    }

    delete_establishment(user_id, establishment_id, connection)?;

    Ok("Estabelecimento excluído com sucesso.".to_owned())
}

/// Handle establishment deletion requests.
///
/// Always responds with an action result, see [crate::ActionResult].
/// An ID that is not a number is rejected as [Error::InvalidEstablishmentRequest].
pub async fn delete_establishment_endpoint(
    establishment_id: Result<Path<DatabaseId>, PathRejection>,
    State(state): State<EstablishmentState>,
    HxRequest(is_htmx): HxRequest,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let establishment_id = match establishment_id {
        Ok(Path(establishment_id)) => establishment_id,
        Err(rejection) => {
            tracing::info!("rejected establishment ID: {rejection}");
            return respond(Err(Error::InvalidEstablishmentRequest), StatusCode::OK, is_htmx);
        }
    };

    let outcome = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
        .and_then(|connection| {
            delete_establishment_action(user_id, establishment_id, &connection)
        });

    if let Err(error) = &outcome {
        tracing::info!("could not delete establishment {establishment_id}: {error}");
    }

    respond(outcome, StatusCode::OK, is_htmx)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, Transaction, UserId, create_transaction,
        db::initialize,
        establishment::{
            EstablishmentName, EstablishmentState, create_establishment, db::get_establishments,
        },
        test_utils::parse_json_body,
    };

    use super::{delete_establishment_action, delete_establishment_endpoint};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn deletes_unused_establishment() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let establishment =
            create_establishment(user_id, EstablishmentName::new("Posto").unwrap(), &conn).unwrap();

        let got = delete_establishment_action(user_id, establishment.id, &conn);

        assert_eq!(got, Ok("Estabelecimento excluído com sucesso.".to_owned()));
        assert!(get_establishments(user_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn blocks_delete_while_transactions_use_the_name() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let establishment =
            create_establishment(user_id, EstablishmentName::new("Posto").unwrap(), &conn).unwrap();
        create_transaction(
            user_id,
            Transaction::build(-150.0, date!(2025 - 03 - 08), " posto "),
            &conn,
        )
        .unwrap();
        let count_before = get_establishments(user_id, &conn).unwrap().len();

        let got = delete_establishment_action(user_id, establishment.id, &conn);

        assert_eq!(got, Err(Error::EstablishmentInUse("Posto".to_owned())));
        assert_eq!(get_establishments(user_id, &conn).unwrap().len(), count_before);
    }

    #[test]
    fn other_users_transactions_do_not_block_delete() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let establishment =
            create_establishment(user_id, EstablishmentName::new("Posto").unwrap(), &conn).unwrap();
        create_transaction(
            UserId::new(2),
            Transaction::build(-150.0, date!(2025 - 03 - 08), "Posto"),
            &conn,
        )
        .unwrap();

        let got = delete_establishment_action(user_id, establishment.id, &conn);

        assert!(got.is_ok());
    }

    #[test]
    fn missing_establishment_is_reported() {
        let conn = get_test_connection();

        let got = delete_establishment_action(UserId::new(1), 404, &conn);

        assert_eq!(got, Err(Error::DeleteMissingEstablishment));
    }

    #[tokio::test]
    async fn blocked_delete_returns_failure_json() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let establishment =
            create_establishment(user_id, EstablishmentName::new("Mercado").unwrap(), &conn)
                .unwrap();
        create_transaction(
            user_id,
            Transaction::build(-80.0, date!(2025 - 03 - 02), "Mercado"),
            &conn,
        )
        .unwrap();
        let state = EstablishmentState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "America/Sao_Paulo".to_owned(),
        };

        let response = delete_establishment_endpoint(
            Ok(Path(establishment.id)),
            State(state.clone()),
            HxRequest(false),
            Extension(user_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = parse_json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Não é possível excluir: existem lançamentos vinculados a este estabelecimento. \
            Remova ou altere os lançamentos primeiro."
        );
        let remaining = get_establishments(user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn missing_establishment_returns_not_found_json() {
        let state = EstablishmentState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            local_timezone: "America/Sao_Paulo".to_owned(),
        };

        let response = delete_establishment_endpoint(
            Ok(Path(7)),
            State(state),
            HxRequest(false),
            Extension(UserId::new(1)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = parse_json_body(response).await;
        assert_eq!(json["error"], "Estabelecimento não encontrado.");
    }
}
