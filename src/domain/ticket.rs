use std::sync::LazyLock;

use regex::Regex;

/// Project prefix of the issue tracker keys embedded in commit messages.
pub const PROJECT_KEY: &str = "FF";

static TICKET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(FF[\s*\-\s*]*)(?P<task>\d*)(?P<desc>.*)").unwrap());

/// A ticket reference parsed out of a commit message. Derived only; the
/// reference lives exactly as long as one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketReference {
    pub task_id: String,
    pub description: String,
}

impl TicketReference {
    /// Unanchored search over the full message, matching the key anywhere.
    pub fn search(message: &str) -> Option<Self> {
        let captures = TICKET_PATTERN.captures(message)?;
        Some(Self {
            task_id: captures["task"].to_string(),
            description: captures["desc"].trim().to_string(),
        })
    }

    pub fn title(&self) -> String {
        format!("{PROJECT_KEY}-{} {}", self.task_id, self.description)
    }

    /// Browse link into the tracker. References without a numeric task id
    /// have nothing to link to.
    pub fn browse_url(&self, tracker_base_url: &str) -> Option<String> {
        if self.task_id.is_empty() {
            return None;
        }
        Some(format!(
            "{}/browse/{PROJECT_KEY}-{}",
            tracker_base_url.trim_end_matches('/'),
            self.task_id
        ))
    }
}
