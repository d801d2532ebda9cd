//! Application router configuration.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::auth_guard,
    category::{
        get_expense_categories_json, get_expense_categories_page, get_income_categories_json,
        get_income_categories_page,
    },
    endpoints,
    establishment::{
        create_establishment_endpoint, delete_establishment_endpoint, get_establishments_json,
        get_establishments_page, get_top_establishments_json, get_top_establishments_page,
    },
    invoice::{get_invoices_json, get_invoices_page},
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
///
/// Every page and API route requires a session cookie, see [auth_guard].
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(
            endpoints::EXPENSE_CATEGORIES_VIEW,
            get(get_expense_categories_page),
        )
        .route(
            endpoints::INCOME_CATEGORIES_VIEW,
            get(get_income_categories_page),
        )
        .route(endpoints::INVOICES_VIEW, get(get_invoices_page))
        .route(endpoints::ESTABLISHMENTS_VIEW, get(get_establishments_page))
        .route(
            endpoints::TOP_ESTABLISHMENTS_VIEW,
            get(get_top_establishments_page),
        );

    let api_routes = Router::new()
        .route(
            endpoints::EXPENSE_CATEGORIES_API,
            get(get_expense_categories_json),
        )
        .route(
            endpoints::INCOME_CATEGORIES_API,
            get(get_income_categories_json),
        )
        .route(endpoints::INVOICES_API, get(get_invoices_json))
        .route(
            endpoints::ESTABLISHMENTS_API,
            get(get_establishments_json).post(create_establishment_endpoint),
        )
        .route(
            endpoints::DELETE_ESTABLISHMENT,
            delete(delete_establishment_endpoint),
        )
        .route(
            endpoints::TOP_ESTABLISHMENTS_API,
            get(get_top_establishments_json),
        );

    page_routes
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the expense categories page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::EXPENSE_CATEGORIES_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::{Router, routing::post};
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::{Duration, macros::date};

    use crate::{
        AppState, Transaction, UserId,
        auth::{AuthState, COOKIE_USER_ID},
        create_transaction, endpoints,
        endpoints::format_endpoint,
        set_session_cookie,
    };

    use super::build_router;

    const SECRET: &str = "correct horse battery staple";

    fn get_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, SECRET, "America/Sao_Paulo").unwrap();
        {
            let conn = state.db_connection.lock().unwrap();
            create_transaction(
                UserId::new(1),
                Transaction::build(-42.0, date!(2025 - 03 - 10), "Mercado"),
                &conn,
            )
            .unwrap();
        }

        state
    }

    /// Get a session cookie encrypted with the same key as `state`.
    async fn get_session_cookie(state: &AppState, user_id: UserId) -> Cookie<'static> {
        let auth_state = AuthState {
            cookie_key: state.cookie_key.clone(),
        };
        let app = Router::new()
            .route(
                "/log_in",
                post(move |jar: PrivateCookieJar| async move {
                    set_session_cookie(jar, user_id, Duration::minutes(5))
                }),
            )
            .with_state(auth_state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        server.post("/log_in").await.cookie(COOKIE_USER_ID)
    }

    #[tokio::test]
    async fn api_requires_session() {
        let server = TestServer::try_new(build_router(get_state())).unwrap();

        let response = server.get(endpoints::ESTABLISHMENTS_API).await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn lists_establishments_with_session() {
        let state = get_state();
        let cookie = get_session_cookie(&state, UserId::new(1)).await;
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server
            .get(endpoints::ESTABLISHMENTS_API)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!([
            {"name": "Mercado", "lancamentosCount": 1, "estabelecimentoId": null}
        ]));
    }

    #[tokio::test]
    async fn creates_then_deletes_establishment() {
        let state = get_state();
        let cookie = get_session_cookie(&state, UserId::new(1)).await;
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server
            .post(endpoints::ESTABLISHMENTS_API)
            .add_cookie(cookie.clone())
            .form(&[("name", "Farmácia")])
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let rows: serde_json::Value = server
            .get(endpoints::ESTABLISHMENTS_API)
            .add_cookie(cookie.clone())
            .await
            .json();
        let id = rows
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["name"] == "Farmácia")
            .and_then(|row| row["estabelecimentoId"].as_i64())
            .expect("created establishment should be listed");

        let response = server
            .delete(&format_endpoint(endpoints::DELETE_ESTABLISHMENT, id))
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "success": true,
            "message": "Estabelecimento excluído com sucesso.",
        }));
    }

    #[tokio::test]
    async fn non_numeric_establishment_id_gets_failure_json() {
        let state = get_state();
        let cookie = get_session_cookie(&state, UserId::new(1)).await;
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server
            .delete("/api/estabelecimentos/abc")
            .add_cookie(cookie)
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_json(&serde_json::json!({
            "success": false,
            "error": "Estabelecimento inválido.",
        }));
    }

    #[tokio::test]
    async fn non_form_body_gets_failure_json() {
        let state = get_state();
        let cookie = get_session_cookie(&state, UserId::new(1)).await;
        let server = TestServer::try_new(build_router(state)).unwrap();

        let response = server
            .post(endpoints::ESTABLISHMENTS_API)
            .add_cookie(cookie)
            .json(&serde_json::json!({"name": "Farmácia"}))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        response.assert_json(&serde_json::json!({
            "success": false,
            "error": "Estabelecimento inválido.",
        }));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = TestServer::try_new(build_router(get_state())).unwrap();

        let response = server.get("/nao-existe").await;

        response.assert_status_not_found();
    }
}
