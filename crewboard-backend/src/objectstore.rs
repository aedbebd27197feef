//! Object storage for uploaded project files
//!
//! Files are kept gzip-compressed in the `stored_file` table and handed out as
//! stable `/api/v1/files/{id}` URLs.

use std::io::{Read, Write};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use crewboard_shared::error::CrewboardError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use tracing::{debug, error};
use uuid::Uuid;

use crate::entity::stored_file;
use crate::error::WebError;
use crate::extract::ApiPath;
use crate::SharedState;

pub const FILES_PATH: &str = "/api/v1/files/";

/// A file that arrived with a request
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store the file, returning the URL it can be fetched from.
    async fn put(&self, file: &UploadedFile) -> Result<String, CrewboardError>;

    /// Remove a previously stored file. Deleting a file that's already gone succeeds.
    async fn delete(&self, url: &str) -> Result<(), CrewboardError>;
}

pub struct DbObjectStorage {
    conn: DatabaseConnection,
    base_url: String,
}

impl DbObjectStorage {
    pub fn new(conn: DatabaseConnection, base_url: &str) -> Self {
        Self {
            conn,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, id: Uuid) -> String {
        format!("{}{}{}", self.base_url, FILES_PATH, id)
    }

    /// The stored file id of a URL we handed out, whatever origin it was handed out under.
    fn id_from_url(url: &str) -> Result<Uuid, CrewboardError> {
        url.rsplit_once(FILES_PATH)
            .and_then(|(_, id)| Uuid::parse_str(id).ok())
            .ok_or_else(|| CrewboardError::Upload(format!("{url} is not a stored file URL")))
    }
}

#[async_trait]
impl ObjectStorage for DbObjectStorage {
    async fn put(&self, file: &UploadedFile) -> Result<String, CrewboardError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&file.data)?;
        let compressed_data = encoder.finish()?;

        let id = Uuid::new_v4();
        let stored = stored_file::ActiveModel {
            id: Set(id),
            filename: Set(file.filename.clone()),
            content_type: Set(file.content_type.clone()),
            size: Set(file.data.len() as i64),
            data: Set(compressed_data),
            created: Set(Utc::now()),
        };
        stored.insert(&self.conn).await.map_err(|err| {
            error!("Failed to store file {}: {:?}", file.filename, err);
            CrewboardError::Upload(format!("Failed to store {}", file.filename))
        })?;

        debug!(id = %id, size = file.data.len(), "Stored file");
        Ok(self.url_for(id))
    }

    async fn delete(&self, url: &str) -> Result<(), CrewboardError> {
        let id = Self::id_from_url(url)?;
        let res = stored_file::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(|err| {
                error!("Failed to delete file {}: {:?}", id, err);
                CrewboardError::Upload(format!("Failed to delete {url}"))
            })?;
        if res.rows_affected == 0 {
            debug!(id = %id, "Stored file was already gone");
        }
        Ok(())
    }
}

/// Serve a stored file
/// GET /api/v1/files/{id}
#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    params(("id" = Uuid, Path, description = "Stored file id")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "No such file"),
    )
)]
pub async fn download_file(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, WebError> {
    let file = stored_file::Entity::find_by_id(id)
        .one(&state.read().await.conn)
        .await?
        .ok_or_else(|| WebError::not_found(format!("File {} not found", id)))?;

    let mut decoder = GzDecoder::new(&file.data[..]);
    let mut decompressed_data = Vec::new();
    decoder.read_to_end(&mut decompressed_data).map_err(|e| {
        WebError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to decompress file data: {}", e),
        )
    })?;

    debug!("Serving stored file {}", id);

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, file.content_type),
            (
                CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file.filename.replace('"', "")),
            ),
        ],
        decompressed_data,
    )
        .into_response())
}
