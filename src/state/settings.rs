//! User settings and partial updates

use serde::{Deserialize, Serialize};

use crate::error::{ClockError, Result};

/// Sound played when no custom sound is selected
pub const DEFAULT_SOUND_URL: &str = "https://assets.mixkit.co/active_storage/sfx/936/936-preview.mp3";
/// Upper bound for the sound start offset, in seconds
pub const MAX_SOUND_START_SECS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Violet,
    Sage,
    Coral,
    Sky,
    Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    Black,
    Cosmos,
    Aurora,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Ru,
}

/// Application settings. Missing fields in stored JSON take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: ThemeColor,
    pub background: BackgroundType,
    pub language: Language,
    #[serde(rename = "is24Hour")]
    pub is_24_hour: bool,
    /// `default` or `custom`
    pub sound_id: String,
    /// Session-only reference to a custom sound; never persisted
    pub custom_sound_url: Option<String>,
    pub custom_sound_name: Option<String>,
    /// Seconds into the sound where ringing starts
    pub sound_start_time: u32,
    pub ascending_volume: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: ThemeColor::Violet,
            background: BackgroundType::Black,
            language: Language::Ru,
            is_24_hour: true,
            sound_id: "default".to_string(),
            custom_sound_url: None,
            custom_sound_name: None,
            sound_start_time: 0,
            ascending_volume: true,
        }
    }
}

impl AppSettings {
    /// Copy suitable for storage, with the transient custom sound cleared
    pub fn persistable(&self) -> Self {
        Self {
            custom_sound_url: None,
            custom_sound_name: None,
            ..self.clone()
        }
    }

    /// Sound the ringer should play
    pub fn sound_source(&self) -> &str {
        match (&self.custom_sound_url, self.sound_id.as_str()) {
            (Some(url), "custom") => url,
            _ => DEFAULT_SOUND_URL,
        }
    }

    /// Validate and apply a partial update; on error nothing changes
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<()> {
        if let Some(start) = patch.sound_start_time {
            if start > MAX_SOUND_START_SECS {
                return Err(ClockError::invalid_input(format!(
                    "soundStartTime must be at most {} seconds",
                    MAX_SOUND_START_SECS
                )));
            }
        }
        if let Some(sound_id) = &patch.sound_id {
            if sound_id != "default" && sound_id != "custom" {
                return Err(ClockError::invalid_input(format!("unknown soundId '{}'", sound_id)));
            }
        }

        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(background) = patch.background {
            self.background = background;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(is_24_hour) = patch.is_24_hour {
            self.is_24_hour = is_24_hour;
        }
        if let Some(sound_id) = patch.sound_id {
            self.sound_id = sound_id;
        }
        if let Some(url) = patch.custom_sound_url {
            self.custom_sound_url = url;
        }
        if let Some(name) = patch.custom_sound_name {
            self.custom_sound_name = name;
        }
        if let Some(start) = patch.sound_start_time {
            self.sound_start_time = start;
        }
        if let Some(ascending) = patch.ascending_volume {
            self.ascending_volume = ascending;
        }
        Ok(())
    }
}

/// Partial settings update; absent fields are left untouched.
/// The custom sound fields take `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub theme: Option<ThemeColor>,
    pub background: Option<BackgroundType>,
    pub language: Option<Language>,
    #[serde(rename = "is24Hour")]
    pub is_24_hour: Option<bool>,
    pub sound_id: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_sound_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_sound_name: Option<Option<String>>,
    pub sound_start_time: Option<u32>,
    pub ascending_volume: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_blob_merges_over_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"theme":"sky","is24Hour":false}"#).unwrap();

        assert_eq!(settings.theme, ThemeColor::Sky);
        assert!(!settings.is_24_hour);
        assert_eq!(settings.language, Language::Ru);
        assert!(settings.ascending_volume);
    }

    #[test]
    fn persistable_drops_custom_sound() {
        let settings = AppSettings {
            sound_id: "custom".to_string(),
            custom_sound_url: Some("/music/wake.ogg".to_string()),
            custom_sound_name: Some("wake.ogg".to_string()),
            ..AppSettings::default()
        };

        let stored = settings.persistable();
        assert_eq!(stored.custom_sound_url, None);
        assert_eq!(stored.custom_sound_name, None);
        assert_eq!(stored.sound_id, "custom");
    }

    #[test]
    fn custom_sound_only_used_when_selected() {
        let mut settings = AppSettings {
            custom_sound_url: Some("/music/wake.ogg".to_string()),
            ..AppSettings::default()
        };
        assert_eq!(settings.sound_source(), DEFAULT_SOUND_URL);

        settings.sound_id = "custom".to_string();
        assert_eq!(settings.sound_source(), "/music/wake.ogg");

        settings.custom_sound_url = None;
        assert_eq!(settings.sound_source(), DEFAULT_SOUND_URL);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let mut settings = AppSettings {
            custom_sound_url: Some("/music/wake.ogg".to_string()),
            ..AppSettings::default()
        };

        let absent: SettingsPatch = serde_json::from_str(r#"{"theme":"coral"}"#).unwrap();
        settings.apply(absent).unwrap();
        assert_eq!(settings.custom_sound_url.as_deref(), Some("/music/wake.ogg"));
        assert_eq!(settings.theme, ThemeColor::Coral);

        let cleared: SettingsPatch = serde_json::from_str(r#"{"customSoundUrl":null}"#).unwrap();
        settings.apply(cleared).unwrap();
        assert_eq!(settings.custom_sound_url, None);
    }

    #[test]
    fn out_of_range_offset_changes_nothing() {
        let mut settings = AppSettings::default();
        let patch = SettingsPatch {
            theme: Some(ThemeColor::Rgb),
            sound_start_time: Some(MAX_SOUND_START_SECS + 1),
            ..SettingsPatch::default()
        };

        assert!(matches!(settings.apply(patch), Err(ClockError::InvalidInput(_))));
        assert_eq!(settings, AppSettings::default());
    }
}
