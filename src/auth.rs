//! Resolves the current user from the session cookie.
//!
//! Users log in through a separate service which stores the user ID in a
//! private (encrypted) cookie. Every protected route reads it here and passes
//! it on as `Extension<UserId>`.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use axum_htmx::HxRequest;
use time::{Duration, OffsetDateTime};

use crate::{ActionResult, AppState, UserId, alert::Alert, html::error_view};

/// The name of the cookie holding the user ID.
pub(crate) const COOKIE_USER_ID: &str = "user_id";

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Add the session cookie for `user_id` to the cookie jar, valid for `duration` from now.
pub fn set_session_cookie(
    jar: PrivateCookieJar,
    user_id: UserId,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, user_id.as_i64().to_string()))
            .expires(OffsetDateTime::now_utc() + duration)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the user ID from the session cookie, `None` if missing or malformed.
pub(crate) fn get_user_id_from_cookie(jar: &PrivateCookieJar) -> Option<UserId> {
    let cookie = jar.get(COOKIE_USER_ID)?;

    cookie.value_trimmed().parse().ok().map(UserId::new)
}

/// Middleware that rejects requests without a valid session cookie.
///
/// The user ID is placed into the request extensions, so route handlers can
/// use the function argument `Extension(user_id): Extension<UserId>`.
///
/// Rejected requests get a 401 response: JSON for API routes, an alert for
/// HTMX requests and an error page otherwise.
pub async fn auth_guard(
    State(state): State<AuthState>,
    HxRequest(is_htmx): HxRequest,
    request: Request,
    next: Next,
) -> Response {
    let is_api = request.uri().path().starts_with("/api");
    let (mut parts, body) = request.into_parts();

    let user_id = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => get_user_id_from_cookie(&jar),
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}");
            None
        }
    };

    let Some(user_id) = user_id else {
        tracing::debug!("rejecting unauthenticated request to {}", parts.uri);
        return unauthorized_response(is_api, is_htmx);
    };

    parts.extensions.insert(user_id);

    next.run(Request::from_parts(parts, body)).await
}

fn unauthorized_response(is_api: bool, is_htmx: bool) -> Response {
    if is_htmx {
        return (
            StatusCode::UNAUTHORIZED,
            Alert::Error {
                message: "Sessão expirada".to_owned(),
                details: "Faça login novamente.".to_owned(),
            }
            .into_html(),
        )
            .into_response();
    }

    if is_api {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ActionResult::failure(
                "Sessão expirada. Faça login novamente.",
            )),
        )
            .into_response();
    }

    (
        StatusCode::UNAUTHORIZED,
        error_view(
            "Não autorizado",
            "401",
            "Sessão expirada",
            "Faça login novamente para continuar.",
        ),
    )
        .into_response()
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use sha2::Digest;
    use time::Duration;

    use crate::{
        UserId,
        auth::{AuthState, COOKIE_USER_ID, auth_guard, set_session_cookie},
    };

    async fn test_handler(Extension(user_id): Extension<UserId>) -> Html<String> {
        Html(format!("<h1>Olá, {user_id}!</h1>"))
    }

    async fn stub_log_in_route(jar: PrivateCookieJar) -> PrivateCookieJar {
        set_session_cookie(jar, UserId::new(7), Duration::minutes(5))
    }

    const TEST_LOG_IN_ROUTE: &str = "/log_in";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_test_server() -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route(TEST_API_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn protected_route_receives_user_id_from_cookie() {
        let server = get_test_server();
        let response = server.post(TEST_LOG_IN_ROUTE).await;
        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_USER_ID);

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookie(cookie).await;

        response.assert_status_ok();
        response.assert_text("<h1>Olá, 7!</h1>");
    }

    #[tokio::test]
    async fn page_without_cookie_gets_error_page() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_unauthorized();
        assert!(response.text().contains("Sessão expirada"));
    }

    #[tokio::test]
    async fn api_without_cookie_gets_failure_json() {
        let server = get_test_server();

        let response = server.get(TEST_API_ROUTE).await;

        response.assert_status_unauthorized();
        response.assert_json(&serde_json::json!({
            "success": false,
            "error": "Sessão expirada. Faça login novamente.",
        }));
    }

    #[tokio::test]
    async fn htmx_request_without_cookie_gets_alert() {
        let server = get_test_server();

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .await;

        response.assert_status_unauthorized();
        assert!(response.text().contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn tampered_cookie_is_rejected() {
        let server = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_USER_ID, "1")).build())
            .await;

        response.assert_status_unauthorized();
    }
}
