//! Cli things
//!

use std::path::PathBuf;

use clap::Parser;
use uuid::Uuid;

pub fn db_path_default() -> String {
    shellexpand::tilde("~/.cache/crewboard.sqlite3").to_string()
}

#[derive(Parser, Debug)]
pub struct CliOpts {
    #[clap(long, help = "Path to the database file", env = "CREWBOARD_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[clap(long, help = "Enable debug logging")]
    pub debug: bool,

    #[clap(
        long,
        help = "Secret used to sign and verify access tokens",
        env = "CREWBOARD_JWT_SECRET",
        hide_env_values = true
    )]
    pub jwt_secret: String,

    #[clap(
        long,
        help = "Access token lifetime in minutes",
        env = "CREWBOARD_JWT_EXPIRY_MINS",
        default_value_t = 60
    )]
    pub jwt_expiry_mins: i64,

    #[clap(
        long,
        help = "Externally visible base URL, used when handing out file links",
        env = "CREWBOARD_PUBLIC_URL"
    )]
    pub public_url: Option<String>,

    #[clap(long, help = "Print an access token for this user id and exit")]
    pub issue_token: Option<Uuid>,
}
