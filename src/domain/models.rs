use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STUDY_DURATION_SECONDS: u32 = 7200;
pub const DEFAULT_BREAK_DURATION_SECONDS: u32 = 300;

pub const STUDY_DURATION_OPTIONS: &[u32] = &[3600, 5400, 7200, 9000, 10800];
pub const BREAK_DURATION_OPTIONS: &[u32] = &[300, 600, 900, 1200];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Study,
    Break,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Self::Study => Self::Break,
            Self::Break => Self::Study,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Break => "break",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: Phase,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub completed: bool,
}

impl SessionRecord {
    pub fn validate(&self) -> Result<(), String> {
        if self.id <= 0 {
            return Err("record.id must be positive".to_string());
        }
        if self.duration_seconds == 0 {
            return Err("record.duration_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: chrono::NaiveDate,
    pub total_study_seconds: u64,
    pub total_break_seconds: u64,
    pub completed_count: u32,
    pub incomplete_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpotifyToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SpotifyToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now && !self.access_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_art: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub study_duration: u32,
    pub break_duration: u32,
    pub play_notification: bool,
    pub selected_playlist_id: Option<String>,
    pub selected_playlist_name: Option<String>,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            study_duration: DEFAULT_STUDY_DURATION_SECONDS,
            break_duration: DEFAULT_BREAK_DURATION_SECONDS,
            play_notification: true,
            selected_playlist_id: None,
            selected_playlist_name: None,
        }
    }
}

impl TimerSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !STUDY_DURATION_OPTIONS.contains(&self.study_duration) {
            return Err(format!(
                "settings.study_duration must be one of {:?}",
                STUDY_DURATION_OPTIONS
            ));
        }
        if !BREAK_DURATION_OPTIONS.contains(&self.break_duration) {
            return Err(format!(
                "settings.break_duration must be one of {:?}",
                BREAK_DURATION_OPTIONS
            ));
        }
        if let Some(playlist_id) = self.selected_playlist_id.as_deref() {
            if playlist_id.trim().is_empty() {
                return Err("settings.selected_playlist_id must not be empty".to_string());
            }
        }
        Ok(())
    }
}
