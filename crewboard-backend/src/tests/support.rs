//! Shared fixtures for the service and HTTP tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crewboard_shared::error::CrewboardError;
use crewboard_shared::project::{ProjectRequest, RecruitRequest};
use crewboard_shared::StringVec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::clock::ManualClock;
use crate::entity::project;
use crate::objectstore::{ObjectStorage, UploadedFile};
use crate::service::{CommentService, ProjectService};

/// Keeps files in a map, with switches to make either operation fail.
#[derive(Default)]
pub(crate) struct MemoryStorage {
    files: Mutex<HashMap<String, UploadedFile>>,
    puts: Mutex<u32>,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn has(&self, url: &str) -> bool {
        self.files.lock().expect("poisoned").contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.files.lock().expect("poisoned").len()
    }

    /// How many uploads were attempted, successful or not
    pub fn put_count(&self) -> u32 {
        *self.puts.lock().expect("poisoned")
    }

    pub fn get(&self, url: &str) -> Option<UploadedFile> {
        self.files.lock().expect("poisoned").get(url).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, file: &UploadedFile) -> Result<String, CrewboardError> {
        *self.puts.lock().expect("poisoned") += 1;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(CrewboardError::Upload("storage is down".to_string()));
        }
        let url = format!("memory://files/{}", Uuid::new_v4());
        self.files
            .lock()
            .expect("poisoned")
            .insert(url.clone(), file.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), CrewboardError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CrewboardError::Upload("storage is down".to_string()));
        }
        self.files.lock().expect("poisoned").remove(url);
        Ok(())
    }
}

/// 2026-01-01 12:00:00 UTC, where every manual clock starts
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) struct TestEnv {
    pub conn: DatabaseConnection,
    pub storage: Arc<MemoryStorage>,
    pub clock: ManualClock,
}

impl TestEnv {
    pub async fn new() -> Self {
        let conn = crate::storage::start_db(None)
            .await
            .expect("Failed to start in-memory db");
        Self {
            conn,
            storage: Arc::new(MemoryStorage::default()),
            clock: ManualClock::new(fixed_now()),
        }
    }

    pub fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(&self.conn, self.storage.as_ref(), &self.clock)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(&self.conn, &self.clock)
    }

    /// Looks a project up by its (unique within the test) title.
    pub async fn project_titled(&self, title: &str) -> project::Model {
        project::Entity::find()
            .filter(project::Column::Title.eq(title))
            .one(&self.conn)
            .await
            .expect("Failed to query projects")
            .unwrap_or_else(|| panic!("No project titled {title}"))
    }
}

pub(crate) fn project_request(title: &str, positions: &[&str]) -> ProjectRequest {
    ProjectRequest {
        title: title.to_string(),
        deadline: fixed_now() + chrono::TimeDelta::days(30),
        soft_skill: "Shows up to standups".to_string(),
        important_question: "What are you hoping to learn?".to_string(),
        tech_stack: StringVec(vec!["Rust".to_string(), "Postgres".to_string()]),
        description: format!("{title} needs a crew"),
        recruit: positions
            .iter()
            .map(|position| RecruitRequest {
                position: position.to_string(),
                current_count: 0,
                target_count: 2,
            })
            .collect(),
    }
}

pub(crate) fn text_file(name: &str, body: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        content_type: "text/plain".to_string(),
        data: body.as_bytes().to_vec(),
    }
}
