use chrono::Utc;

use super::Session;
use crate::models::User;

/// Number of placeholder users written on every startup
pub const SEED_USER_COUNT: usize = 5;

/// Reset the `user` table to "User 1".."User 5"
///
/// Destroys whatever the table held before. Runs in a single transaction.
#[tracing::instrument(name = "db.reseed", skip_all)]
pub async fn reseed(session: &mut Session) -> Result<Vec<User>, sqlx::Error> {
    let users = placeholder_users();
    session.replace_users(&users).await?;

    tracing::info!(count = users.len(), "Seeded user table");
    Ok(users)
}

fn placeholder_users() -> Vec<User> {
    let mut last = Utc::now();
    (1..=SEED_USER_COUNT)
        .map(|i| {
            // Wall clock can step backwards; keep timestamps non-decreasing
            let now = Utc::now().max(last);
            last = now;
            User::with_timestamp(format!("User {}", i), now)
        })
        .collect()
}
