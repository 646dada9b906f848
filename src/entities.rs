use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// Remote operations exposed under `{api_url}api/`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Status,
    Pause,
    Unpause,
    TogglePause,
    AbortAll,
    RestartFailed,
    ToggleReconnect,
    DeleteFinished,
    Restart,
    Version,
    FreeSpace,
    AddPackage,
    UploadContainer,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Command::Status,
        Command::Pause,
        Command::Unpause,
        Command::TogglePause,
        Command::AbortAll,
        Command::RestartFailed,
        Command::ToggleReconnect,
        Command::DeleteFinished,
        Command::Restart,
        Command::Version,
        Command::FreeSpace,
        Command::AddPackage,
        Command::UploadContainer,
    ];

    /// Path segment appended to the API base, case-sensitive
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Status => "statusServer",
            Command::Pause => "pauseServer",
            Command::Unpause => "unpauseServer",
            Command::TogglePause => "togglePause",
            Command::AbortAll => "stopAllDownloads",
            Command::RestartFailed => "restartFailed",
            Command::ToggleReconnect => "toggleReconnect",
            Command::DeleteFinished => "deleteFinished",
            Command::Restart => "restart",
            Command::Version => "getServerVersion",
            Command::FreeSpace => "freeSpace",
            Command::AddPackage => "addPackage",
            Command::UploadContainer => "uploadContainer",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a newly created package is placed
#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Destination {
    Collector = 0,
    Queue = 1,
}

/// Snapshot returned by `statusServer`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusServerResponse {
    /// Download queue is paused; never true together with `downloading`
    #[serde(rename = "pause")]
    pub paused: bool,
    /// Number of active downloads
    pub active: u32,
    /// Number of downloads waiting in the queue
    #[serde(rename = "queue")]
    pub queued: u32,
    pub total: u32,
    /// Current download speed in bytes per second
    pub speed: f64,
    /// Server will start downloading as soon as files are queued
    #[serde(rename = "download")]
    pub downloading: bool,
    #[serde(rename = "reconnect")]
    pub reconnect_enabled: bool,
    /// Captcha request pending. Older servers don't report it.
    #[serde(rename = "captcha", default, skip_serializing_if = "Option::is_none")]
    pub captcha_pending: Option<bool>,
}

/// Session information returned by a successful login
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LoginResponse {
    #[serde(rename = "_permanent")]
    pub permanent: bool,
    pub authenticated: bool,
    #[serde(rename = "id")]
    pub user_id: i64,
    pub name: String,
    pub role: i64,
    #[serde(rename = "perms")]
    pub permissions: i64,
    pub template: String,
    /// Flash messages, kept opaque
    #[serde(rename = "_flashes")]
    pub flashes: Vec<Value>,
}
