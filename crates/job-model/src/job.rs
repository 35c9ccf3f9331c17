//! Render job input and result types.
//!
//! A job is a single JSON object:
//!
//! ```json
//! {
//!   "video_path": "clips/sea.mp4",
//!   "quote": "Stay hungry, stay foolish.",
//!   "style": {"fontSize": 64, "position": "bottom"},
//!   "output_path": "out/sea-quote.mp4",
//!   "music_path": "music/calm.mp3",
//!   "max_duration": 15
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::style::TextStyle;

/// Longest accepted quote, in characters.
pub const MAX_QUOTE_CHARS: usize = 500;

/// A render job as supplied on the command line or stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Source video.
    pub video_path: PathBuf,

    /// Caption text.
    pub quote: String,

    /// Caption style. Required, but every key inside is optional.
    pub style: TextStyle,

    /// Where the rendered video is written.
    pub output_path: PathBuf,

    /// Background music mixed under the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_path: Option<PathBuf>,

    /// Upper bound on output length in seconds. `0` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
}

impl JobConfig {
    /// Parse and validate a job from JSON text.
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        let job: Self = serde_json::from_str(json)?;
        job.validate()?;
        Ok(job)
    }

    /// Check field contents beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.video_path.as_os_str().is_empty() {
            return Err(JobError::invalid("video_path must not be empty"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(JobError::invalid("output_path must not be empty"));
        }

        if self.quote.trim().is_empty() {
            return Err(JobError::invalid("quote must be a non-empty string"));
        }
        let quote_chars = self.quote.chars().count();
        if quote_chars > MAX_QUOTE_CHARS {
            return Err(JobError::invalid(format!(
                "quote must be at most {MAX_QUOTE_CHARS} characters (got {quote_chars})"
            )));
        }

        if let Some(max) = self.max_duration {
            if !max.is_finite() || max < 0.0 {
                return Err(JobError::invalid(format!(
                    "max_duration must be a non-negative number of seconds (got {max})"
                )));
            }
        }

        if let Some(music) = &self.music_path {
            if music.as_os_str().is_empty() {
                return Err(JobError::invalid("music_path must not be empty"));
            }
        }

        self.style.validate()
    }

    /// The requested duration cap, if it limits anything.
    pub fn duration_limit(&self) -> Option<f64> {
        self.max_duration.filter(|max| *max > 0.0)
    }
}

/// Result line printed after a successful render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    pub output: PathBuf,
}

impl JobResult {
    pub fn success(output: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// Single-line JSON encoding.
    pub fn to_json_line(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Errors raised while reading a job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Malformed job JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid job: {message}")]
    Invalid { message: String },
}

impl JobError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid {
            message: msg.into(),
        }
    }
}
