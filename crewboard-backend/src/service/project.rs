use crewboard_shared::error::CrewboardError;
use crewboard_shared::project::{
    is_recent, PageRequest, ProjectDetail, ProjectRequest, ProjectSearch, ProjectSummary,
    RecruitRequest, RecruitmentStatus,
};
use crewboard_shared::response::Page;
use crewboard_shared::UserId;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use sea_query::Expr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::entity::{comment, favorite, project, recruit};
use crate::objectstore::{ObjectStorage, UploadedFile};

pub const PROJECT_SAVED: &str = "Project saved";
pub const PROJECT_UPDATED: &str = "Project updated";
pub const PROJECT_DELETED: &str = "Project deleted";
pub const FAVORITE_ADDED: &str = "Favorite added";
pub const FAVORITE_REMOVED: &str = "Favorite removed";

pub struct ProjectService<'a> {
    conn: &'a DatabaseConnection,
    storage: &'a dyn ObjectStorage,
    clock: &'a dyn Clock,
}

/// Builds the recruit rows for a project, in submission order.
fn build_recruits(project_id: Uuid, requests: &[RecruitRequest]) -> Vec<recruit::ActiveModel> {
    requests
        .iter()
        .enumerate()
        .map(|(index, request)| recruit::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            position: Set(request.position.clone()),
            current_count: Set(request.current_count),
            target_count: Set(request.target_count),
            sort_order: Set(index as i32),
        })
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<'a> ProjectService<'a> {
    pub fn new(
        conn: &'a DatabaseConnection,
        storage: &'a dyn ObjectStorage,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            conn,
            storage,
            clock,
        }
    }

    /// Upload the file if there's one with content, otherwise there's no URL.
    async fn upload(&self, file: Option<UploadedFile>) -> Result<Option<String>, CrewboardError> {
        match file.filter(|file| !file.is_empty()) {
            Some(file) => Ok(Some(self.storage.put(&file).await?)),
            None => Ok(None),
        }
    }

    /// Remove a file we uploaded for an operation that then failed.
    async fn discard_upload(&self, url: &str) {
        if let Err(err) = self.storage.delete(url).await {
            warn!(url, error = ?err, "Failed to remove upload of a failed operation");
        }
    }

    #[instrument(level = "debug", skip_all, fields(owner = %caller))]
    pub async fn create(
        &self,
        request: ProjectRequest,
        file: Option<UploadedFile>,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        request.validate()?;

        let file_url = self.upload(file).await?;

        let project_id = Uuid::new_v4();
        let recruits = build_recruits(project_id, &request.recruit);
        let position = request.position_summary();

        let project = project::ActiveModel {
            id: Set(project_id),
            title: Set(request.title),
            user_id: Set(caller.as_uuid()),
            file_url: Set(file_url.clone()),
            deadline: Set(request.deadline),
            soft_skill: Set(request.soft_skill),
            important_question: Set(request.important_question),
            tech_stack: Set(request.tech_stack),
            description: Set(request.description),
            position: Set(position),
            recruitment: Set(RecruitmentStatus::Open),
            created_at: Set(self.clock.now()),
            last_modified: Set(None),
            view_count: Set(0),
        };

        if let Err(err) = self.insert_project(project, recruits).await {
            if let Some(url) = &file_url {
                self.discard_upload(url).await;
            }
            return Err(err);
        }

        info!(project_id = %project_id, "Created project");
        Ok(PROJECT_SAVED.to_string())
    }

    async fn insert_project(
        &self,
        project: project::ActiveModel,
        recruits: Vec<recruit::ActiveModel>,
    ) -> Result<(), CrewboardError> {
        let txn = self.conn.begin().await?;
        project.insert(&txn).await?;
        if !recruits.is_empty() {
            recruit::Entity::insert_many(recruits)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(project_id = %project_id, caller = %caller))]
    pub async fn update(
        &self,
        project_id: Uuid,
        request: ProjectRequest,
        file: Option<UploadedFile>,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        request.validate()?;

        let existing = project::Entity::find_by_id(project_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| CrewboardError::NotFound(format!("Project {project_id} not found")))?;

        if existing.owner() != caller {
            warn!("Refusing update from someone other than the owner");
            return Err(CrewboardError::Forbidden(
                "Only the project owner can change it".to_string(),
            ));
        }

        let previous_url = existing.stored_file_url().map(str::to_string);
        let replacement_url = self.upload(file).await?;

        let recruits = build_recruits(project_id, &request.recruit);
        let position = request.position_summary();

        let mut project = existing.into_active_model();
        project.title = Set(request.title);
        // without a new upload the stored url stays Unchanged
        if let Some(url) = &replacement_url {
            project.file_url = Set(Some(url.clone()));
        }
        project.deadline = Set(request.deadline);
        project.important_question = Set(request.important_question);
        project.soft_skill = Set(request.soft_skill);
        project.tech_stack = Set(request.tech_stack);
        project.description = Set(request.description);
        project.position = Set(position);
        project.last_modified = Set(Some(self.clock.now()));

        if let Err(err) = self.replace_project(project_id, project, recruits).await {
            if let Some(url) = &replacement_url {
                self.discard_upload(url).await;
            }
            return Err(err);
        }

        if let (Some(_), Some(old_url)) = (&replacement_url, &previous_url) {
            if let Err(err) = self.storage.delete(old_url).await {
                warn!(url = old_url, error = ?err, "Failed to remove replaced file");
            }
        }

        info!("Updated project");
        Ok(PROJECT_UPDATED.to_string())
    }

    /// Swap the whole recruit list and write the project fields in one transaction.
    async fn replace_project(
        &self,
        project_id: Uuid,
        project: project::ActiveModel,
        recruits: Vec<recruit::ActiveModel>,
    ) -> Result<(), CrewboardError> {
        let txn = self.conn.begin().await?;
        let removed = recruit::Entity::delete_many()
            .filter(recruit::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;
        debug!(removed = removed.rows_affected, "Cleared previous recruits");
        if !recruits.is_empty() {
            recruit::Entity::insert_many(recruits)
                .exec_without_returning(&txn)
                .await?;
        }
        project.update(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(project_id = %project_id, caller = %caller))]
    pub async fn delete(&self, project_id: Uuid, caller: UserId) -> Result<String, CrewboardError> {
        // someone else's project looks exactly like a missing one
        let project = project::Entity::find()
            .filter(project::Column::Id.eq(project_id))
            .filter(project::Column::UserId.eq(caller.as_uuid()))
            .one(self.conn)
            .await?
            .ok_or_else(|| CrewboardError::NotFound(format!("Project {project_id} not found")))?;

        if let Some(url) = project.stored_file_url() {
            self.storage.delete(url).await?;
        }

        let res = project.delete(self.conn).await?;
        debug!(rows = res.rows_affected, "Deleted project");
        Ok(PROJECT_DELETED.to_string())
    }

    fn annotate(&self, projects: Vec<project::Model>) -> Vec<ProjectSummary> {
        let now = self.clock.now();
        projects
            .into_iter()
            .map(|project| {
                let recent = is_recent(project.created_at, now);
                project.summary(recent)
            })
            .collect()
    }

    async fn fetch_page(
        &self,
        select: Select<project::Entity>,
        paging: PageRequest,
    ) -> Result<Page<ProjectSummary>, CrewboardError> {
        // an offset past i64 would panic in the sqlite binder
        paging.offset()?;
        let paginator = select.paginate(self.conn, paging.clamped_size());
        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(paging.page).await?;
        Ok(Page {
            items: self.annotate(items),
            total_pages: totals.number_of_pages,
            total_elements: totals.number_of_items,
        })
    }

    pub async fn find_list(
        &self,
        search: &ProjectSearch,
    ) -> Result<Page<ProjectSummary>, CrewboardError> {
        let mut select = project::Entity::find();
        if let Some(keyword) = non_blank(&search.keyword) {
            select = select.filter(project::Column::Title.contains(keyword));
        }
        if let Some(position) = non_blank(&search.position) {
            select = select.filter(project::Column::Position.contains(position));
        }
        if let Some(tech) = non_blank(&search.tech_stack) {
            select = select.filter(project::Column::TechStack.contains(tech));
        }
        if let Some(status) = search.recruitment {
            select = select.filter(project::Column::Recruitment.eq(status));
        }
        let select = select
            .order_by_desc(project::Column::CreatedAt)
            .order_by_asc(project::Column::Id);

        self.fetch_page(select, search.paging()).await
    }

    pub async fn find_favorite_list(
        &self,
        caller: UserId,
        paging: PageRequest,
    ) -> Result<Page<ProjectSummary>, CrewboardError> {
        let select = project::Entity::find()
            .inner_join(favorite::Entity)
            .filter(favorite::Column::UserId.eq(caller.as_uuid()))
            .order_by_desc(favorite::Column::CreatedAt)
            .order_by_asc(project::Column::Id);

        self.fetch_page(select, paging).await
    }

    pub async fn find_my_list(
        &self,
        caller: UserId,
        paging: PageRequest,
    ) -> Result<Page<ProjectSummary>, CrewboardError> {
        let select = project::Entity::find()
            .filter(project::Column::UserId.eq(caller.as_uuid()))
            .order_by_desc(project::Column::CreatedAt)
            .order_by_asc(project::Column::Id);

        self.fetch_page(select, paging).await
    }

    pub async fn find_hot_list(&self, size: u64) -> Result<Vec<ProjectSummary>, CrewboardError> {
        let projects = project::Entity::find()
            .order_by_desc(project::Column::ViewCount)
            .order_by_desc(project::Column::CreatedAt)
            .limit(PageRequest::new(0, size).clamped_size())
            .all(self.conn)
            .await?;
        Ok(self.annotate(projects))
    }

    /// Counts a view and loads the detail projection, `None` if there's no such project.
    pub async fn find_by_id(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProjectDetail>, CrewboardError> {
        project::Entity::update_many()
            .col_expr(
                project::Column::ViewCount,
                Expr::col(project::Column::ViewCount).add(1),
            )
            .filter(project::Column::Id.eq(project_id))
            .exec(self.conn)
            .await?;

        let Some(project) = project::Entity::find_by_id(project_id)
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        let recruits = project
            .find_related(recruit::Entity)
            .order_by_asc(recruit::Column::SortOrder)
            .all(self.conn)
            .await?;
        let comment_count = project.find_related(comment::Entity).count(self.conn).await?;
        let favorite_count = project
            .find_related(favorite::Entity)
            .count(self.conn)
            .await?;

        Ok(Some(ProjectDetail {
            id: project.id,
            title: project.title,
            user_id: UserId(project.user_id),
            file_url: project.file_url,
            deadline: project.deadline,
            soft_skill: project.soft_skill,
            important_question: project.important_question,
            tech_stack: project.tech_stack,
            description: project.description,
            position: project.position,
            recruitment: project.recruitment,
            created_at: project.created_at,
            last_modified: project.last_modified,
            view_count: project.view_count,
            recruits: recruits.into_iter().map(Into::into).collect(),
            comment_count,
            favorite_count,
        }))
    }

    pub async fn add_favorite(
        &self,
        project_id: Uuid,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        if project::Entity::find_by_id(project_id)
            .one(self.conn)
            .await?
            .is_none()
        {
            return Err(CrewboardError::NotFound(format!(
                "Project {project_id} not found"
            )));
        }

        let existing = favorite::Entity::find_by_id((caller.as_uuid(), project_id))
            .one(self.conn)
            .await?;
        if existing.is_none() {
            favorite::ActiveModel {
                user_id: Set(caller.as_uuid()),
                project_id: Set(project_id),
                created_at: Set(self.clock.now()),
            }
            .insert(self.conn)
            .await?;
        }
        Ok(FAVORITE_ADDED.to_string())
    }

    pub async fn remove_favorite(
        &self,
        project_id: Uuid,
        caller: UserId,
    ) -> Result<String, CrewboardError> {
        let res = favorite::Entity::delete_by_id((caller.as_uuid(), project_id))
            .exec(self.conn)
            .await?;
        debug!(rows = res.rows_affected, "Removed favorite");
        Ok(FAVORITE_REMOVED.to_string())
    }
}
