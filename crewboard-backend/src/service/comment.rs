use crewboard_shared::comment::{CommentUpdate, CommentView};
use crewboard_shared::error::CrewboardError;
use crewboard_shared::project::PageRequest;
use crewboard_shared::response::Slice;
use crewboard_shared::UserId;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::entity::{comment, project};

pub const COMMENT_SAVED: &str = "Comment saved";
pub const COMMENT_UPDATED: &str = "Comment updated";
pub const COMMENT_DELETED: &str = "Comment deleted";

pub struct CommentService<'a> {
    conn: &'a DatabaseConnection,
    clock: &'a dyn Clock,
}

fn checked_content(content: &str) -> Result<String, CrewboardError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CrewboardError::Validation(
            "comment must not be empty".to_string(),
        ));
    }
    Ok(content.to_string())
}

impl<'a> CommentService<'a> {
    pub fn new(conn: &'a DatabaseConnection, clock: &'a dyn Clock) -> Self {
        Self { conn, clock }
    }

    /// Loads a comment of `project_id` that `caller` wrote.
    async fn owned_comment(
        &self,
        project_id: Uuid,
        comment_id: Uuid,
        caller: UserId,
    ) -> Result<comment::Model, CrewboardError> {
        let comment = comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::ProjectId.eq(project_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| CrewboardError::NotFound(format!("Comment {comment_id} not found")))?;

        if UserId(comment.user_id) != caller {
            warn!(comment_id = %comment_id, caller = %caller, "Refusing change to someone else's comment");
            return Err(CrewboardError::Forbidden(
                "Only the author can change a comment".to_string(),
            ));
        }
        Ok(comment)
    }

    pub async fn post(
        &self,
        project_id: Uuid,
        content: &str,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        let content = checked_content(content)?;

        if project::Entity::find_by_id(project_id)
            .one(self.conn)
            .await?
            .is_none()
        {
            return Err(CrewboardError::NotFound(format!(
                "Project {project_id} not found"
            )));
        }

        let comment = comment::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            user_id: Set(caller.as_uuid()),
            content: Set(content),
            created_at: Set(self.clock.now()),
            last_modified: Set(None),
        }
        .insert(self.conn)
        .await?;

        debug!(comment_id = %comment.id, project_id = %project_id, "Saved comment");
        Ok(COMMENT_SAVED.to_string())
    }

    /// Newest comments first, fetching one extra row to learn whether more follow.
    pub async fn list(
        &self,
        project_id: Uuid,
        paging: PageRequest,
    ) -> Result<Slice<CommentView>, CrewboardError> {
        let size = paging.clamped_size();
        let comments = comment::Entity::find()
            .filter(comment::Column::ProjectId.eq(project_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .offset(paging.offset()?)
            .limit(size + 1)
            .all(self.conn)
            .await?;

        let slice = Slice::from_overfetch(comments, size as usize);
        Ok(Slice {
            items: slice.items.into_iter().map(Into::into).collect(),
            has_next: slice.has_next,
        })
    }

    pub async fn update(
        &self,
        project_id: Uuid,
        update: CommentUpdate,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        let content = checked_content(&update.content)?;
        let comment = self
            .owned_comment(project_id, update.comment_id, caller)
            .await?;

        let mut comment = comment.into_active_model();
        comment.content = Set(content);
        comment.last_modified = Set(Some(self.clock.now()));
        comment.update(self.conn).await?;

        Ok(COMMENT_UPDATED.to_string())
    }

    pub async fn delete(
        &self,
        project_id: Uuid,
        comment_id: Uuid,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        let comment = self.owned_comment(project_id, comment_id, caller).await?;
        comment.delete(self.conn).await?;
        Ok(COMMENT_DELETED.to_string())
    }
}
