use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Scrape-Relay
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default = "default_specialized")]
    pub specialized: Vec<SpecializedEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            pool: PoolConfig::default(),
            cache: CacheConfig::default(),
            fetch: FetchConfig::default(),
            render: RenderConfig::default(),
            specialized: default_specialized(),
        }
    }
}

/// Which extraction the backend performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// Service converts the page to Markdown (`/scrape-url`)
    Markdown,
    /// Service returns the page HTML with scripts, styles and meta removed (`/clean-html`)
    CleanHtml,
    /// Page HTML is fetched directly, no service involved
    Raw,
}

impl ExtractionMode {
    /// Stable name used in fingerprints and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::CleanHtml => "clean-html",
            Self::Raw => "raw",
        }
    }

    /// Parses a mode name as accepted on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "markdown" => Some(Self::Markdown),
            "clean-html" => Some(Self::CleanHtml),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

/// Extraction backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Base URL of the extraction service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_mode")]
    pub mode: ExtractionMode,

    /// User agent sent by every session
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout for a single HTTP request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            mode: default_mode(),
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Session pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Fixed number of reusable sessions
    #[serde(default = "default_pool_size")]
    pub size: u32,

    /// How long `acquire` waits for a free session (milliseconds)
    #[serde(rename = "acquire-timeout-ms", default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

/// Cache expiry configuration
///
/// Absent values mean the entry never expires on its own; it is replaced only
/// by a force-refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "ready-ttl-secs")]
    pub ready_ttl_secs: Option<u64>,

    #[serde(rename = "failure-ttl-secs")]
    pub failure_ttl_secs: Option<u64>,
}

/// Per-request timing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// How long a caller waits for `resolve` (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound on one Extract call (milliseconds)
    #[serde(rename = "extract-timeout-ms", default = "default_extract_timeout_ms")]
    pub extract_timeout_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_millis(self.extract_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            extract_timeout_ms: default_extract_timeout_ms(),
        }
    }
}

/// External tools used by the render chain
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Markdown to HTML converter, invoked as `<converter> in.md -o out.html`
    #[serde(default = "default_converter")]
    pub converter: String,

    /// Graphical opener for the converted file; platform default when absent
    pub viewer: Option<String>,

    #[serde(default = "default_editor")]
    pub editor: String,
}

impl RenderConfig {
    /// The configured viewer, or the platform's opener
    pub fn viewer_or_default(&self) -> String {
        self.viewer.clone().unwrap_or_else(|| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else {
                "xdg-open".to_string()
            }
        })
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            converter: default_converter(),
            viewer: None,
            editor: default_editor(),
        }
    }
}

/// Domain handled by a specialized extractor
#[derive(Debug, Clone, Deserialize)]
pub struct SpecializedEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_mode() -> ExtractionMode {
    ExtractionMode::Markdown
}

fn default_user_agent() -> String {
    format!("scrape-relay/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_pool_size() -> u32 {
    4
}

fn default_acquire_timeout_ms() -> u64 {
    3_500
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_extract_timeout_ms() -> u64 {
    15_000
}

fn default_converter() -> String {
    "pandoc".to_string()
}

fn default_editor() -> String {
    "code".to_string()
}

fn default_specialized() -> Vec<SpecializedEntry> {
    vec![SpecializedEntry {
        domain: "*.wikipedia.org".to_string(),
    }]
}
