//! Save Record
//!
//! Flat progress record: which level the player is on and how much health
//! they have. Where the bytes go is the host's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::constants::PLAYER_MAX_HEALTH;

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Level a fresh save starts on.
pub const DEFAULT_LEVEL_ID: &str = "level1";

/// Save record errors.
#[derive(Debug, Error)]
pub enum SaveError {
    /// JSON encode/decode failed.
    #[error("save json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encode/decode failed.
    #[error("save binary error: {0}")]
    Binary(#[from] bincode::Error),

    /// Record written by a newer build.
    #[error("unsupported save version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Record belongs to another level than the one loaded.
    #[error("save is for level '{found}', but '{expected}' is loaded")]
    LevelMismatch { expected: String, found: String },
}

/// Persisted progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub current_level_id: String,
    pub player_health: i32,
    pub saved_at: DateTime<Utc>,
    pub version: u32,
}

impl Default for SaveData {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_ID, PLAYER_MAX_HEALTH)
    }
}

impl SaveData {
    /// New record stamped with the current time.
    pub fn new(current_level_id: impl Into<String>, player_health: i32) -> Self {
        Self::at(current_level_id, player_health, Utc::now())
    }

    /// New record with an explicit timestamp.
    pub fn at(current_level_id: impl Into<String>, player_health: i32, saved_at: DateTime<Utc>) -> Self {
        Self {
            current_level_id: current_level_id.into(),
            player_health,
            saved_at,
            version: SAVE_VERSION,
        }
    }

    /// Reject records from a newer format.
    pub fn check_version(&self) -> Result<(), SaveError> {
        if self.version > SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: self.version,
                supported: SAVE_VERSION,
            });
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: Self = serde_json::from_str(json)?;
        data.check_version()?;
        Ok(data)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveError> {
        let data: Self = bincode::deserialize(data)?;
        data.check_version()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid date")
    }

    #[test]
    fn test_defaults() {
        let data = SaveData::default();
        assert_eq!(data.current_level_id, "level1");
        assert_eq!(data.player_health, 5);
        assert_eq!(data.version, SAVE_VERSION);
    }

    #[test]
    fn test_json_and_binary_agree() {
        let data = SaveData::at("level3", 2, fixed_time());

        let from_json = SaveData::from_json(&data.to_json().unwrap()).unwrap();
        let from_bytes = SaveData::from_bytes(&data.to_bytes().unwrap()).unwrap();

        assert_eq!(from_json, data);
        assert_eq!(from_bytes, data);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let data = SaveData::from_json(r#"{ "current_level_id": "level2" }"#).unwrap();
        assert_eq!(data.current_level_id, "level2");
        assert_eq!(data.player_health, PLAYER_MAX_HEALTH);
        assert_eq!(data.version, SAVE_VERSION);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut data = SaveData::at("level1", 5, fixed_time());
        data.version = SAVE_VERSION + 1;
        let json = serde_json::to_string(&data).unwrap();

        assert!(matches!(
            SaveData::from_json(&json),
            Err(SaveError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(SaveData::from_json("not json"), Err(SaveError::Json(_))));
        assert!(matches!(SaveData::from_bytes(&[1, 2]), Err(SaveError::Binary(_))));
    }
}
