use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Immutable input for one chapter download
#[derive(Debug, Clone)]
pub struct ChapterRequest {
    /// Chapter page URL
    pub url: String,
    /// Destination directory for the saved images
    pub output_dir: PathBuf,
    /// Base filename; pages become `<name>_<NNN>.<ext>`
    pub name: String,
    /// Page-load wait ceiling and per-image fetch timeout
    pub timeout: Duration,
    /// Retries per image after the first attempt
    pub max_retries: usize,
}

/// One image on the chapter page. Indices are 1-based and follow on-page
/// order, which defines output filename numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub index: usize,
    pub url: String,
}

/// A page that could not be saved
#[derive(Debug, Clone, Serialize)]
pub struct ImageFailure {
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// Outcome summary for one chapter download
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChapterResult {
    pub attempted: usize,
    pub saved: usize,
    pub failures: Vec<ImageFailure>,
}

impl ChapterResult {
    /// True only if every image on the page was saved
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.saved == self.attempted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_result() {
        let result = ChapterResult {
            attempted: 3,
            saved: 3,
            failures: Vec::new(),
        };
        assert!(result.is_complete());
    }

    #[test]
    fn test_partial_result_is_not_complete() {
        let result = ChapterResult {
            attempted: 3,
            saved: 2,
            failures: vec![ImageFailure {
                index: 2,
                url: "https://cdn.example.net/2.jpg".to_string(),
                reason: "failed after 4 attempts".to_string(),
            }],
        };
        assert!(!result.is_complete());
    }
}
