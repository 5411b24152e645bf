pub mod health;
pub mod root;
pub mod users;

use crate::db::Database;
use crate::upstream::OutboundClient;

/// State shared by every route
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub outbound: OutboundClient,
    /// Make `GET /users` fail after doing its work
    pub simulate_errors: bool,
}
