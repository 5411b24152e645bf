use axum::{extract::State, response::Json};

use super::AppState;
use crate::error::AppError;
use crate::models::User;

/// List every user, calling the outbound endpoint once per row
///
/// With `simulate_errors` set, the handler still does all of that, then logs
/// at warn and error level and fails, which the error handler turns into a 500.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    tracing::info!("Listing users");

    let mut session = state.db.acquire_session().await?;
    let users = session.list_users().await?;
    drop(session);

    tracing::info!(count = users.len(), "Fetched users");

    for user in &users {
        tracing::debug!(user_id = %user.id, user_name = %user.name, "Calling outbound endpoint");
        state.outbound.ping().await;
    }

    if state.simulate_errors {
        tracing::warn!(count = users.len(), "Error simulation enabled, this request will fail");
        tracing::error!("Simulated failure after listing users");
        return Err(AppError::Simulated(format!(
            "listing {} users was configured to fail",
            users.len()
        )));
    }

    Ok(Json(users))
}
