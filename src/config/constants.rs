use std::time::Duration;

/// Title assigned to conversations created without one
pub const TITLE_PLACEHOLDER: &str = "Untitled Conversation";

/// Inclusive bounds for every analysis score field
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// Message preview cut-off in the admin lists (characters)
pub const PREVIEW_LENGTH: usize = 50;

pub const LOG_FILE_PATH: &str = "/tmp/convodesk.log";

/// UI tick interval when no terminal event arrives
pub const FRAME_DURATION: Duration = Duration::from_millis(100);

/// How often the lists re-read the database to pick up rows written by
/// the external scoring process
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);
