use chrono::{DateTime, Utc};
use crewboard_shared::project::{ProjectSummary, RecruitmentStatus};
use crewboard_shared::{StringVec, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub file_url: Option<String>,
    pub deadline: DateTime<Utc>,
    pub soft_skill: String,
    pub important_question: String,
    pub tech_stack: StringVec,
    pub description: String,
    /// Comma-joined recruit positions, only ever written by the project service
    pub position: String,
    pub recruitment: RecruitmentStatus,
    pub created_at: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub view_count: i64,
}

impl Model {
    pub fn owner(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Stored file url, treating an empty string as no file
    pub fn stored_file_url(&self) -> Option<&str> {
        self.file_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn summary(self, recent: bool) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            title: self.title,
            user_id: UserId(self.user_id),
            file_url: self.file_url,
            deadline: self.deadline,
            position: self.position,
            tech_stack: self.tech_stack,
            recruitment: self.recruitment,
            created_at: self.created_at,
            view_count: self.view_count,
            recent,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recruit::Entity")]
    Recruits,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
}

impl Related<super::recruit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recruits.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
