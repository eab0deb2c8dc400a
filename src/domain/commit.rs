// Auto-generated merge messages carry no information for the body.
const MERGE_MARKERS: [&str; 3] = ["Merge pull request #", "Merge remote", "Merge branch"];

#[derive(Debug, Clone)]
pub struct Commit {
    pub message: String,
}

impl Commit {
    pub fn is_merge_message(&self) -> bool {
        MERGE_MARKERS
            .iter()
            .any(|marker| self.message.contains(marker))
    }
}
