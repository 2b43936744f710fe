use serde::{Deserialize, Serialize};

/// Status of speech recognition and microphone authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Restricted,
    Undetermined,
}

impl PermissionStatus {
    /// Message used when a start is rejected for this status.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            PermissionStatus::Granted => "Speech recognition authorized",
            PermissionStatus::Denied => "User denied access to speech recognition",
            PermissionStatus::Restricted => "Speech recognition restricted on this device",
            PermissionStatus::Undetermined => "Speech recognition not yet authorized",
        }
    }
}

/// Hint for the type of recognition task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskHint {
    #[default]
    Unspecified,
    Dictation,
    Search,
    Confirmation,
}

/// Pass-through hints for the recognizer.
///
/// Each field is best-effort; engines ignore what they do not support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionOptions {
    /// Phrases to prioritize during recognition.
    pub contextual_strings: Vec<String>,
    /// Force on-device recognition.
    pub requires_on_device_recognition: Option<bool>,
    pub task_hint: Option<TaskHint>,
    /// Automatically punctuate results.
    pub adds_punctuation: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_is_empty() {
        let options = RecognitionOptions::default();
        assert!(options.contextual_strings.is_empty());
        assert!(options.requires_on_device_recognition.is_none());
        assert!(options.task_hint.is_none());
        assert!(options.adds_punctuation.is_none());
    }

    #[test]
    fn test_options_partial_toml() {
        let options: RecognitionOptions =
            toml::from_str("task_hint = \"dictation\"\nadds_punctuation = true").unwrap();
        assert_eq!(options.task_hint, Some(TaskHint::Dictation));
        assert_eq!(options.adds_punctuation, Some(true));
        assert!(options.contextual_strings.is_empty());
    }

    #[test]
    fn test_permission_status_serialization() {
        let json = serde_json::to_string(&PermissionStatus::Undetermined).unwrap();
        assert_eq!(json, "\"undetermined\"");
    }
}
