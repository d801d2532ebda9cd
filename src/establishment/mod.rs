//! Establishments (estabelecimentos): where the user spends money.
//!
//! Transactions carry a free text name. Establishments are those names
//! merged with the records the user created explicitly.

mod create;
mod db;
mod delete;
mod domain;
mod list;
mod reconcile;
mod top;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use create::{create_establishment_action, create_establishment_endpoint};
pub use db::{
    count_transactions_by_name, create_establishment, create_establishment_table,
    delete_establishment, get_establishment, get_establishments,
};
pub use delete::{delete_establishment_action, delete_establishment_endpoint};
pub use domain::{Establishment, EstablishmentFormData, EstablishmentName, EstablishmentRow};
pub use list::{get_establishments_json, get_establishments_page};
pub use reconcile::{
    compare_names, fetch_establishments_for_user, normalize_name_key, reconcile_establishments,
};
pub use top::{
    TopCategory, TopEstablishment, TopEstablishments, TopEstablishmentsSummary,
    fetch_top_establishments, get_top_establishments_json, get_top_establishments_page,
};

/// The state needed for the establishment pages and endpoints.
#[derive(Debug, Clone)]
pub struct EstablishmentState {
    /// The database connection for reading and writing establishments.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for EstablishmentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
