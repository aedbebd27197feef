use std::net::TcpListener;

use rand::Rng;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod comment;
pub mod error;
pub mod project;
pub mod response;

/// Opaque identity of an authenticated user.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for UserId {
    fn from(value: uuid::Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A list of strings stored as a JSON array column
#[derive(
    Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
#[serde(transparent)]
pub struct StringVec(pub Vec<String>);

impl StringVec {
    pub fn empty() -> Self {
        Self(Vec::new())
    }
}

impl From<Vec<&str>> for StringVec {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(|v| v.to_string()).collect())
    }
}

pub struct AddrInfo {
    pub addr: String,
    pub port: u16,
    pub https: bool,
}

impl AddrInfo {
    pub fn as_url(&self) -> String {
        let scheme = match self.https {
            true => "https",
            false => "http",
        };
        format!("{}://{}:{}", scheme, self.addr, self.port)
    }

    pub fn as_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn from_env() -> Self {
        let https = match std::env::var("CREWBOARD_HTTPS") {
            Ok(val) => val == "true",
            Err(_) => false,
        };

        let port: u16 = match std::env::var("CREWBOARD_PORT") {
            Ok(val) => val.parse().unwrap_or(8190),
            Err(_) => 8190,
        };

        Self {
            addr: std::env::var("CREWBOARD_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            https,
        }
    }

    pub fn test() -> Self {
        // select a random port
        let mut rng = rand::rng();

        let mut port: u16 = rng.random_range(32768..65535);
        loop {
            if TcpListener::bind(format!("127.0.0.1:{}", port)).is_ok() {
                break;
            }
            port = rng.random_range(32768..65535);
        }

        Self {
            https: false,
            addr: "127.0.0.1".to_string(),
            port,
        }
    }
}
