//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/estabelecimentos/{establishment_id}', use [format_endpoint].

/// The root route which redirects to the expense categories page.
pub const ROOT: &str = "/";
/// The page listing expenses by category for a period.
pub const EXPENSE_CATEGORIES_VIEW: &str = "/categorias/despesas";
/// The page listing income by category for a period.
pub const INCOME_CATEGORIES_VIEW: &str = "/categorias/receitas";
/// The page listing credit card invoices for a period.
pub const INVOICES_VIEW: &str = "/faturas";
/// The page listing establishments.
pub const ESTABLISHMENTS_VIEW: &str = "/estabelecimentos";
/// The page ranking establishments for a period.
pub const TOP_ESTABLISHMENTS_VIEW: &str = "/top-estabelecimentos";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for expenses by category as JSON.
pub const EXPENSE_CATEGORIES_API: &str = "/api/categorias/despesas";
/// The route for income by category as JSON.
pub const INCOME_CATEGORIES_API: &str = "/api/categorias/receitas";
/// The route for the invoice snapshot as JSON.
pub const INVOICES_API: &str = "/api/faturas";
/// The route to list and create establishments.
pub const ESTABLISHMENTS_API: &str = "/api/estabelecimentos";
/// The route to delete an establishment.
pub const DELETE_ESTABLISHMENT: &str = "/api/estabelecimentos/{establishment_id}";
/// The route for the top establishments report as JSON.
pub const TOP_ESTABLISHMENTS_API: &str = "/api/top-estabelecimentos";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Append the `periodo` query parameter for `period` to `endpoint_path`.
pub fn with_period(endpoint_path: &str, period: &crate::Period) -> String {
    format!("{endpoint_path}?periodo={period}")
}
