//! Comment schema
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::UserId;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CommentUpdate {
    pub comment_id: Uuid,
    pub content: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentTarget {
    pub comment_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CommentView {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}
