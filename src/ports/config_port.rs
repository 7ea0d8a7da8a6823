//! Read-only access to `[section] key = value` settings.

use crate::domain::error::AnalysisError;

pub trait ConfigPort {
    /// Raw value, or `None` when the key or section is absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Section names present in the source, lowercased.
    fn sections(&self) -> Vec<String>;

    /// Accepts true/yes/on/1 and false/no/off/0; anything else is
    /// `ConfigInvalid`.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, AnalysisError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(AnalysisError::config_invalid(
                section,
                key,
                format!("expected a boolean, got '{raw}'"),
            )),
        }
    }
}
