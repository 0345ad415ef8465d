//! Page configuration
//!
//! Defaults match the element ids and classes emitted by the comment
//! templates, so a page using those templates needs no configuration at all.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CommentKitError, Result};

/// Generic failure text shown to the visitor.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occured submitting the comment. If you know what you're doing, feel free to check the console for error details.";

/// CommentKit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentKitConfig {
    /// Comment form submission settings
    pub form: FormConfig,

    /// Reply relocation settings
    pub reply: ReplyConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Selector for the comment form (`.class`, `#id` or tag)
    pub form_selector: String,

    /// Id of the submit button
    pub submit_button_id: String,

    /// Id of the success message container
    pub success_message_id: String,

    /// Id of the control that dismisses the success message
    pub close_button_id: String,

    /// Class that hides the success message
    pub hidden_class: String,

    /// Submit button label while a request is pending
    pub busy_label: String,

    /// Alert text for any failed submission
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Id of the cancel-reply link
    pub cancel_link_id: String,

    /// Id of the hidden "replying to" field
    pub replying_to_id: String,

    /// Id of the hidden post identifier field
    pub post_slug_id: String,

    /// Class given to the placeholder left at the form's home position
    pub placeholder_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// Largest response body accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_selector: ".js-comment-form".to_string(),
            submit_button_id: "comment-form-submit".to_string(),
            success_message_id: "success-message".to_string(),
            close_button_id: "close-message".to_string(),
            hidden_class: "hide".to_string(),
            busy_label: "Please wait...".to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            cancel_link_id: "cancel-comment-reply-link".to_string(),
            replying_to_id: "comment-replying-to".to_string(),
            post_slug_id: "comment-post-slug".to_string(),
            placeholder_class: "sm-temp-form-div".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("CommentKit/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            max_redirects: 10,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl CommentKitConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CommentKitError::config_with_source("invalid configuration JSON", e))
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents).map_err(|e| match e {
            CommentKitError::Config { source, .. } => CommentKitError::Config {
                message: format!("invalid configuration in {}", path.display()),
                source,
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_templates() {
        let config = CommentKitConfig::default();
        assert_eq!(config.form.form_selector, ".js-comment-form");
        assert_eq!(config.form.submit_button_id, "comment-form-submit");
        assert_eq!(config.form.hidden_class, "hide");
        assert_eq!(config.reply.cancel_link_id, "cancel-comment-reply-link");
        assert_eq!(config.reply.replying_to_id, "comment-replying-to");
        assert_eq!(config.reply.post_slug_id, "comment-post-slug");
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            CommentKitConfig::from_json_str(r#"{"form": {"busy_label": "Sending..."}}"#).unwrap();
        assert_eq!(config.form.busy_label, "Sending...");
        assert_eq!(config.form.close_button_id, "close-message");
        assert_eq!(config.reply, ReplyConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let err = CommentKitConfig::from_json_str("{ nope").unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"http": {{"timeout_secs": 5}}}}"#).unwrap();

        let config = CommentKitConfig::load(file.path()).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.max_redirects, 10);
        assert_eq!(config.http.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CommentKitConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CommentKitError::Io(_)));
    }
}
