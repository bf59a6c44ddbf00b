use serde::{Deserialize, Serialize};

/// Outcome buckets collected over one run.
///
/// Owned by the run loop and passed by `&mut`; read once at the end of the
/// run to compose the summary notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub validation: Vec<String>,
    pub success: Vec<String>,
    pub noreport: Vec<String>,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_validation(&mut self, entry: impl Into<String>) {
        self.validation.push(entry.into());
    }

    pub fn record_success(&mut self, entry: impl Into<String>) {
        self.success.push(entry.into());
    }

    pub fn record_noreport(&mut self, entry: impl Into<String>) {
        self.noreport.push(entry.into());
    }

    pub fn record_failed(&mut self, entry: impl Into<String>) {
        self.failed.push(entry.into());
    }

    pub fn is_empty(&self) -> bool {
        self.validation.is_empty()
            && self.success.is_empty()
            && self.noreport.is_empty()
            && self.failed.is_empty()
    }

    /// Labelled buckets in presentation order.
    pub fn sections(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Configuration schema or value validation failed for projects", &self.validation),
            ("Reports successfully generated for projects", &self.success),
            ("No Reports available for projects", &self.noreport),
            ("Reports generation failed for projects", &self.failed),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_preserve_insertion_order() {
        let mut summary = RunSummary::new();
        assert!(summary.is_empty());

        summary.record_success("ABC");
        summary.record_success("XYZ");
        summary.record_failed("DEF: HTTP 401");

        assert_eq!(summary.success, vec!["ABC", "XYZ"]);
        let sections = summary.sections();
        assert_eq!(sections[1].1, ["ABC".to_string(), "XYZ".to_string()]);
        assert_eq!(sections[3].1.len(), 1);
        assert!(!summary.is_empty());
    }
}
