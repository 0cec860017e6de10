use std::time::Duration;

/// Skeleton slots provisioned before any authoritative frame count is known.
///
/// A fixed guess at the expected output length, not derived from input; the
/// board trims or grows as real events arrive.
pub const DEFAULT_PLACEHOLDER_COUNT: usize = 6;

/// Configuration for the storyboard service client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the storyboard backend.
    pub base_url: String,
    /// Default HTTP timeout for one-shot requests.
    pub timeout: Duration,
    /// Placeholder slots provisioned per streaming session.
    pub placeholder_count: usize,
    /// Pause between sequential image downloads.
    pub download_delay: Duration,
    /// Bounded update buffer between the session task and the consumer.
    pub update_buffer_capacity: usize,
}

impl ClientConfig {
    /// Creates a config with sensible defaults for the given backend URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(120),
            placeholder_count: DEFAULT_PLACEHOLDER_COUNT,
            download_delay: Duration::from_millis(500),
            update_buffer_capacity: 128,
        }
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the provisioned placeholder count.
    pub fn placeholder_count(mut self, count: usize) -> Self {
        self.placeholder_count = count;
        self
    }

    /// Overrides the pause between sequential image downloads.
    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    /// Overrides the session update buffer size.
    pub fn update_buffer_capacity(mut self, capacity: usize) -> Self {
        self.update_buffer_capacity = capacity;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!("{}/api/generate/stream", self.base())
    }

    pub(crate) fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base())
    }

    pub(crate) fn export_pdf_url(&self) -> String {
        format!("{}/api/export/pdf", self.base())
    }

    pub(crate) fn health_url(&self) -> String {
        format!("{}/api/health", self.base())
    }

    /// Resolves a frame image reference, which the service usually serves as
    /// a root-relative path like `/static/generated/frame_1.png`.
    pub(crate) fn absolute_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!("{}/{}", self.base(), reference.trim_start_matches('/'))
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ClientConfig {
    /// Points at the local development backend.
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
