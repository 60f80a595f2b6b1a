// ABOUTME: Worker classification by process naming convention.
// ABOUTME: A process is a worker when its name contains one of the configured markers.

pub const DEFAULT_WORKER_MARKERS: [&str; 4] = ["-worker", "worker-", "_worker", "worker_"];

/// Case-insensitive substring matcher for worker names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMatcher {
    markers: Vec<String>,
}

impl WorkerMatcher {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn is_worker(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for WorkerMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_MARKERS)
    }
}
