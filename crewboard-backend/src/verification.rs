//! Email verification codes
//!
//! Only storage lives here, sending the mail is someone else's job.

use chrono::{DateTime, Utc};
use crewboard_shared::error::CrewboardError;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entity::verification_code;

/// Remember `code` for `email`, replacing any earlier code.
pub async fn store_code(
    conn: &DatabaseConnection,
    email: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<(), CrewboardError> {
    let model = verification_code::ActiveModel {
        email: Set(email.to_lowercase()),
        code: Set(code.to_string()),
        created_at: Set(now),
    };
    verification_code::Entity::insert(model)
        .on_conflict(
            OnConflict::column(verification_code::Column::Email)
                .update_columns([
                    verification_code::Column::Code,
                    verification_code::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// True when `code` is the last one stored for `email`.
pub async fn check_code(
    conn: &DatabaseConnection,
    email: &str,
    code: &str,
) -> Result<bool, CrewboardError> {
    let stored = verification_code::Entity::find_by_id(email.to_lowercase())
        .one(conn)
        .await?;
    Ok(stored.is_some_and(|stored| stored.code == code))
}
