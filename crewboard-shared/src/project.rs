//! Project-related schema
//!

use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::CrewboardError;
use crate::{StringVec, UserId};

/// How long a freshly created project is flagged as recent.
pub const RECENT_WINDOW: TimeDelta = TimeDelta::days(1);

/// Separator used when joining recruit positions into the summary.
pub const POSITION_SEPARATOR: &str = ", ";

/// Default page size when the caller doesn't specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Upper bound on page sizes, larger requests are clamped.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecruitmentStatus {
    #[default]
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// One open role in a project submission
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RecruitRequest {
    pub position: String,
    #[serde(default)]
    pub current_count: i32,
    pub target_count: i32,
}

/// Body of a create or update submission, sent as the `metadata` multipart field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ProjectRequest {
    pub title: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub soft_skill: String,
    #[serde(default)]
    pub important_question: String,
    #[serde(default)]
    pub tech_stack: StringVec,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recruit: Vec<RecruitRequest>,
}

impl ProjectRequest {
    /// Check the submission before anything is uploaded or stored.
    pub fn validate(&self) -> Result<(), CrewboardError> {
        if self.title.trim().is_empty() {
            return Err(CrewboardError::Validation(
                "title must not be empty".to_string(),
            ));
        }
        for (index, recruit) in self.recruit.iter().enumerate() {
            if recruit.position.trim().is_empty() {
                return Err(CrewboardError::Validation(format!(
                    "recruit {index} has an empty position"
                )));
            }
            if recruit.current_count < 0 || recruit.target_count < 0 {
                return Err(CrewboardError::Validation(format!(
                    "recruit {index} ({}) has a negative count",
                    recruit.position
                )));
            }
            if recruit.current_count > recruit.target_count {
                return Err(CrewboardError::Validation(format!(
                    "recruit {index} ({}) has more members than it is looking for",
                    recruit.position
                )));
            }
        }
        Ok(())
    }

    /// The derived position summary for this submission's recruits.
    pub fn position_summary(&self) -> String {
        position_summary(self.recruit.iter().map(|r| r.position.as_str()))
    }
}

/// Joins recruit positions, in order, into the comma-separated summary stored on a project.
pub fn position_summary<'a>(positions: impl IntoIterator<Item = &'a str>) -> String {
    positions
        .into_iter()
        .collect::<Vec<_>>()
        .join(POSITION_SEPARATOR)
}

/// A project is recent while it's younger than [RECENT_WINDOW] at `now`.
pub fn is_recent(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at) < RECENT_WINDOW
}

/// Listing entry, `recent` is computed at read time and never stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
    pub user_id: UserId,
    pub file_url: Option<String>,
    pub deadline: DateTime<Utc>,
    pub position: String,
    pub tech_stack: StringVec,
    pub recruitment: RecruitmentStatus,
    pub created_at: DateTime<Utc>,
    pub view_count: i64,
    pub recent: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct RecruitView {
    pub id: Uuid,
    pub position: String,
    pub current_count: i32,
    pub target_count: i32,
}

/// Everything the detail page shows about a project
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ProjectDetail {
    pub id: Uuid,
    pub title: String,
    pub user_id: UserId,
    pub file_url: Option<String>,
    pub deadline: DateTime<Utc>,
    pub soft_skill: String,
    pub important_question: String,
    pub tech_stack: StringVec,
    pub description: String,
    pub position: String,
    pub recruitment: RecruitmentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub recruits: Vec<RecruitView>,
    pub comment_count: u64,
    pub favorite_count: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Zero-based paging parameters (`?page=&size=`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// Page size bounded to `1..=MAX_PAGE_SIZE`
    pub fn clamped_size(&self) -> u64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows skipped before this page, refused when it doesn't fit a SQL offset.
    pub fn offset(&self) -> Result<u64, CrewboardError> {
        self.page
            .checked_mul(self.clamped_size())
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| {
                CrewboardError::Validation(format!("page {} is out of range", self.page))
            })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Query parameters for the public project listing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectSearch {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    /// Matches against the title
    pub keyword: Option<String>,
    /// Matches against the position summary
    pub position: Option<String>,
    /// Matches against any tech stack tag
    pub tech_stack: Option<String>,
    pub recruitment: Option<RecruitmentStatus>,
}

impl ProjectSearch {
    pub fn paging(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

impl Default for ProjectSearch {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            keyword: None,
            position: None,
            tech_stack: None,
            recruitment: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HotListQuery {
    #[serde(default = "default_page_size")]
    pub size: u64,
}
