//! Append-only CSV log of users who pressed /start.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use teloxide::types::User;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

const HEADER: [&str; 8] = [
    "Date",
    "User ID",
    "Username",
    "First Name",
    "Last Name",
    "Language Code",
    "Is Bot",
    "Timestamp",
];

/// Written in place of absent optional fields.
const NOT_PROVIDED: &str = "Not provided";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub captured_at: DateTime<Local>,
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    pub is_bot: bool,
}

impl UserRecord {
    pub fn from_user(user: &User, captured_at: DateTime<Local>) -> Self {
        Self {
            captured_at,
            user_id: user.id.0,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            last_name: user.last_name.clone(),
            language_code: user.language_code.clone(),
            is_bot: user.is_bot,
        }
    }

    fn fields(&self) -> [String; 8] {
        let or_sentinel = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(NOT_PROVIDED)
                .to_string()
        };
        [
            self.captured_at.format("%Y-%m-%d").to_string(),
            self.user_id.to_string(),
            or_sentinel(&self.username),
            or_sentinel(&self.first_name),
            or_sentinel(&self.last_name),
            or_sentinel(&self.language_code),
            if self.is_bot { "True" } else { "False" }.to_string(),
            self.captured_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "user log I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Quote a CSV field if it contains a delimiter, quote or line break.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

pub struct UserLogger {
    path: PathBuf,
    /// Serializes appends so concurrent handlers never interleave rows.
    lock: Mutex<()>,
}

impl UserLogger {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file does not exist yet.
    pub async fn record(&self, record: &UserRecord) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let exists = tokio::fs::try_exists(&self.path).await?;
        let mut out = String::new();
        if !exists {
            out.push_str(&csv_row(&HEADER));
        }
        out.push_str(&csv_row(&record.fields()));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(out.as_bytes()).await?;
        file.flush().await?;

        info!("Recorded user {} in {}", record.user_id, self.path.display());
        Ok(())
    }
}
