use chrono::{DateTime, Utc};
use crewboard_shared::comment::CommentView;
use crewboard_shared::UserId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<Model> for CommentView {
    fn from(comment: Model) -> Self {
        CommentView {
            id: comment.id,
            project_id: comment.project_id,
            user_id: UserId(comment.user_id),
            content: comment.content,
            created_at: comment.created_at,
            last_modified: comment.last_modified,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
