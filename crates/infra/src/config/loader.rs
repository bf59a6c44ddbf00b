//! Configuration loader
//!
//! Loads project descriptors and application settings from the `conf/`
//! directory below the base path.
//!
//! ## Project descriptors
//! One file per project, TOML or JSON (detected by file extension):
//!
//! ```toml
//! key = "ABC"
//! enabled = true
//! manager = "lead@example.com, pm@example.com"
//! url = "https://jira.example.com"
//! user = "bot"
//! password = "secret"
//! timezone = "Asia/Kolkata"
//!
//! [source]
//! type = "STASH"
//! url = "https://stash.example.com"
//! user = "bot"
//! password = "secret"
//! repo = "core"
//! ```
//!
//! ## Application settings
//! `conf/dsr.toml` is optional. Environment variables override it:
//! - `DSR_MAIL_FROM`: sender address
//! - `DSR_SPOOL_DIR`: directory for the spool transport
//! - `DSR_SMTP_SERVER`, `DSR_SMTP_PORT`, `DSR_SMTP_TLS`, `DSR_SMTP_USER`,
//!   `DSR_SMTP_PASSWORD`: SMTP relay
//! - `DSR_GMAIL_CLIENT_ID`, `DSR_GMAIL_CLIENT_SECRET`, `DSR_GMAIL_REFRESH_TOKEN`:
//!   Gmail API OAuth credentials
//! - `DSR_HTTP_TIMEOUT_SECS`: request timeout in seconds
//! - `DSR_SSL_SILENT`: accept invalid TLS certificates (true/false)

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use dsr_domain::constants::{CONF_DIR, DEFAULT_MAIL_FROM, SETTINGS_FILE};
use dsr_domain::{Credentials, DsrError, ProjectConfig, Result, RetentionPolicy, SourceConfig, SourceType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::errors::to_dsr;

/* -------------------------------------------------------------------------- */
/* Project descriptors */
/* -------------------------------------------------------------------------- */

/// Manager addresses, either as a list or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ManagerList {
    List(Vec<String>),
    Joined(String),
}

impl Default for ManagerList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ManagerList {
    fn into_addresses(self) -> Vec<String> {
        let raw = match self {
            Self::List(values) => values,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter().map(|value| value.trim().to_string()).filter(|value| !value.is_empty()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SourceDescriptor {
    #[serde(rename = "type")]
    source_type: String,
    url: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    repo: String,
}

/// Project descriptor as written on disk.
#[derive(Debug, Clone, Deserialize)]
struct ProjectDescriptor {
    key: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    manager: ManagerList,
    url: String,
    user: String,
    password: String,
    timezone: String,
    source: SourceDescriptor,
}

fn default_enabled() -> bool {
    true
}

/// Load and validate a single project descriptor.
///
/// # Errors
/// Returns `DsrError::Config` if the file cannot be read or parsed, and
/// `DsrError::Validation` if a value is semantically invalid (disabled
/// project, unknown source type, bad URL or timezone, no managers).
pub fn load_project(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Err(DsrError::Config(format!("Config file not found: {}", path.display())));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| DsrError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    let descriptor: ProjectDescriptor = parse_config(&contents, path)?;
    validate_descriptor(descriptor)
}

/// Load every descriptor found in `conf_dir`, pairing each path with its
/// outcome. A failing descriptor does not prevent the others from loading.
pub fn load_projects(conf_dir: &Path) -> Result<Vec<(PathBuf, Result<ProjectConfig>)>> {
    let paths = discover_projects(conf_dir)?;
    tracing::info!(dir = %conf_dir.display(), descriptors = paths.len(), "Loading project descriptors");

    Ok(paths
        .into_iter()
        .map(|path| {
            let outcome = load_project(&path);
            (path, outcome)
        })
        .collect())
}

/// List descriptor files (`*.toml`, `*.json`) in `conf_dir`, sorted by
/// name. The settings file is excluded.
///
/// # Errors
/// Returns `DsrError::Config` if the directory cannot be read.
pub fn discover_projects(conf_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(conf_dir)
        .map_err(|e| DsrError::Config(format!("Failed to read config directory {}: {}", conf_dir.display(), e)))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| matches!(path.extension().and_then(|e| e.to_str()), Some("toml" | "json")))
        .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some(SETTINGS_FILE))
        .collect();
    paths.sort();
    Ok(paths)
}

fn validate_descriptor(descriptor: ProjectDescriptor) -> Result<ProjectConfig> {
    let key = descriptor.key.trim().to_string();
    if key.is_empty() {
        return Err(DsrError::Validation("project key must not be empty".into()));
    }

    if !descriptor.enabled {
        return Err(DsrError::Validation(format!("project {key} is disabled")));
    }

    let managers = descriptor.manager.into_addresses();
    if managers.is_empty() {
        return Err(DsrError::Validation(format!("project {key} has no manager addresses")));
    }
    if let Some(bad) = managers.iter().find(|address| !address.contains('@')) {
        return Err(DsrError::Validation(format!("project {key} has invalid manager address '{bad}'")));
    }

    let server_url = validate_url(&key, "url", &descriptor.url)?;

    let timezone: Tz = descriptor.timezone.trim().parse().map_err(|_| {
        DsrError::Validation(format!("project {key} has unknown timezone '{}'", descriptor.timezone))
    })?;

    let source_type: SourceType = descriptor
        .source
        .source_type
        .parse()
        .map_err(|_| {
            DsrError::Validation(format!(
                "project {key} has unsupported source type '{}' (expected FISHEYE or STASH)",
                descriptor.source.source_type
            ))
        })?;
    let source_url = validate_url(&key, "source.url", &descriptor.source.url)?;

    Ok(ProjectConfig {
        key,
        managers,
        server_url,
        credentials: Credentials::new(descriptor.user, descriptor.password),
        timezone,
        source: SourceConfig {
            source_type,
            url: source_url,
            credentials: Credentials::new(descriptor.source.user, descriptor.source.password),
            repo: descriptor.source.repo,
        },
    })
}

fn validate_url(key: &str, field: &str, raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| DsrError::Validation(format!("project {key} has invalid {field} '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DsrError::Validation(format!("project {key} {field} must be http(s): '{raw}'")));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

/* -------------------------------------------------------------------------- */
/* Application settings */
/* -------------------------------------------------------------------------- */

/// Gmail API credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct GmailSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_gmail_api_base")]
    pub api_base: String,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: default_token_url(),
            api_base: default_gmail_api_base(),
        }
    }
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com".to_string()
}

/// SMTP relay, `localhost:25` without TLS or login unless set.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Upgrade with STARTTLS before login.
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self { server: default_smtp_server(), port: default_smtp_port(), tls: false, user: None, password: None }
    }
}

fn default_smtp_server() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Directory for the spool transport; defaults to `{base}/outbox`.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub gmail: GmailSettings,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: default_mail_from(),
            spool_dir: None,
            smtp: SmtpSettings::default(),
            gmail: GmailSettings::default(),
        }
    }
}

fn default_mail_from() -> String {
    DEFAULT_MAIL_FROM.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default)]
    pub ssl_silent: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            fetch_concurrency: default_fetch_concurrency(),
            ssl_silent: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_fetch_concurrency() -> usize {
    dsr_domain::constants::DEFAULT_FETCH_CONCURRENCY
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionSettings {
    #[serde(default)]
    pub reports: RetentionPolicy,
    #[serde(default)]
    pub logs: RetentionPolicy,
}

/// Settings shared by every project of a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
}

/// Load `{base}/conf/dsr.toml` if present, then apply environment
/// overrides.
///
/// # Errors
/// Returns `DsrError::Config` if the file exists but is invalid, or an
/// override has an invalid value.
pub fn load_settings(base_path: &Path) -> Result<AppSettings> {
    let path = base_path.join(CONF_DIR).join(SETTINGS_FILE);
    let mut settings = if path.exists() {
        tracing::info!(path = %path.display(), "Loading settings from file");
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| DsrError::Config(format!("Failed to read settings file: {}", e)))?;
        parse_config(&contents, &path)?
    } else {
        tracing::debug!(path = %path.display(), "No settings file, using defaults");
        AppSettings::default()
    };

    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

fn apply_env_overrides(settings: &mut AppSettings) -> Result<()> {
    if let Some(from) = env_var("DSR_MAIL_FROM") {
        settings.mail.from = from;
    }
    if let Some(dir) = env_var("DSR_SPOOL_DIR") {
        settings.mail.spool_dir = Some(PathBuf::from(dir));
    }
    if let Some(server) = env_var("DSR_SMTP_SERVER") {
        settings.mail.smtp.server = server;
    }
    if let Some(port) = env_var("DSR_SMTP_PORT") {
        settings.mail.smtp.port =
            port.parse::<u16>().map_err(|e| DsrError::Config(format!("Invalid DSR_SMTP_PORT: {}", e)))?;
    }
    settings.mail.smtp.tls = env_bool("DSR_SMTP_TLS", settings.mail.smtp.tls);
    if let Some(user) = env_var("DSR_SMTP_USER") {
        settings.mail.smtp.user = Some(user);
    }
    if let Some(password) = env_var("DSR_SMTP_PASSWORD") {
        settings.mail.smtp.password = Some(password);
    }
    if let Some(client_id) = env_var("DSR_GMAIL_CLIENT_ID") {
        settings.mail.gmail.client_id = client_id;
    }
    if let Some(secret) = env_var("DSR_GMAIL_CLIENT_SECRET") {
        settings.mail.gmail.client_secret = secret;
    }
    if let Some(token) = env_var("DSR_GMAIL_REFRESH_TOKEN") {
        settings.mail.gmail.refresh_token = token;
    }
    if let Some(timeout) = env_var("DSR_HTTP_TIMEOUT_SECS") {
        settings.http.timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| DsrError::Config(format!("Invalid DSR_HTTP_TIMEOUT_SECS: {}", e)))?;
    }
    settings.http.ssl_silent = env_bool("DSR_SSL_SILENT", settings.http.ssl_silent);
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `DsrError::Config` if format is invalid or parsing fails.
fn parse_config<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| match to_dsr(e) {
            DsrError::Config(message) => DsrError::Config(format!("{} ({})", message, path.display())),
            other => other,
        }),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DsrError::Config(format!("Invalid JSON format in {}: {}", path.display(), e))),
        _ => Err(DsrError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Non-empty environment variable value.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::{Builder, TempDir};

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const TOML_DESCRIPTOR: &str = r#"
        key = "ABC"
        manager = "lead@example.com, pm@example.com"
        url = "https://jira.example.com/"
        user = "bot"
        password = "secret"
        timezone = "Asia/Kolkata"

        [source]
        type = "stash"
        url = "https://stash.example.com"
        repo = "core"
    "#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(contents.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("DSR_TEST_BOOL_YES", "yes");
        std::env::set_var("DSR_TEST_BOOL_UPPER", "TRUE");
        std::env::set_var("DSR_TEST_BOOL_OFF", "off");

        assert!(env_bool("DSR_TEST_BOOL_YES", false));
        assert!(env_bool("DSR_TEST_BOOL_UPPER", false));
        assert!(!env_bool("DSR_TEST_BOOL_OFF", true));
        std::env::remove_var("DSR_TEST_BOOL_MISSING");
        assert!(env_bool("DSR_TEST_BOOL_MISSING", true));

        std::env::remove_var("DSR_TEST_BOOL_YES");
        std::env::remove_var("DSR_TEST_BOOL_UPPER");
        std::env::remove_var("DSR_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_toml_descriptor() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(dir.path(), "abc.toml", TOML_DESCRIPTOR);

        let project = load_project(&path).expect("valid descriptor");
        assert_eq!(project.key, "ABC");
        assert_eq!(project.managers, vec!["lead@example.com", "pm@example.com"]);
        assert_eq!(project.server_url, "https://jira.example.com");
        assert_eq!(project.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(project.source.source_type, SourceType::Stash);
        assert_eq!(project.credentials.user, "bot");
    }

    #[test]
    fn test_load_json_descriptor_with_manager_list() {
        let json = r#"{
            "key": "XYZ",
            "manager": ["lead@example.com"],
            "url": "http://jira.local",
            "user": "bot",
            "password": "secret",
            "timezone": "UTC",
            "source": {"type": "FISHEYE", "url": "http://fisheye.local", "repo": "main"}
        }"#;
        let mut temp_file = Builder::new().suffix(".json").tempfile().expect("temp file");
        temp_file.write_all(json.as_bytes()).expect("write");

        let project = load_project(temp_file.path()).expect("valid descriptor");
        assert_eq!(project.managers, vec!["lead@example.com"]);
        assert_eq!(project.source.source_type, SourceType::Fisheye);
    }

    #[test]
    fn test_rejects_disabled_and_unknown_source() {
        let dir = TempDir::new().expect("temp dir");

        let disabled = write_file(dir.path(), "off.toml", &format!("enabled = false\n{TOML_DESCRIPTOR}"));
        let err = load_project(&disabled).unwrap_err();
        assert!(matches!(err, DsrError::Validation(ref msg) if msg.contains("disabled")), "{err}");

        let github = write_file(dir.path(), "gh.toml", &TOML_DESCRIPTOR.replace("\"stash\"", "\"github\""));
        let err = load_project(&github).unwrap_err();
        assert!(matches!(err, DsrError::Validation(ref msg) if msg.contains("github")), "{err}");

        let bad_zone = write_file(dir.path(), "tz.toml", &TOML_DESCRIPTOR.replace("Asia/Kolkata", "Mars/Base"));
        assert!(matches!(load_project(&bad_zone), Err(DsrError::Validation(_))));
    }

    #[test]
    fn test_missing_field_is_config_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(dir.path(), "broken.toml", "key = \"ABC\"\n");
        assert!(matches!(load_project(&path), Err(DsrError::Config(_))));
        assert!(matches!(load_project(&dir.path().join("absent.toml")), Err(DsrError::Config(_))));
    }

    #[test]
    fn test_discovery_skips_settings_and_other_files() {
        let dir = TempDir::new().expect("temp dir");
        write_file(dir.path(), "b.toml", TOML_DESCRIPTOR);
        write_file(dir.path(), "a.json", "{}");
        write_file(dir.path(), SETTINGS_FILE, "");
        write_file(dir.path(), "notes.txt", "");

        let found = discover_projects(dir.path()).expect("discover");
        let names: Vec<_> = found.iter().filter_map(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["a.json", "b.toml"]);

        let loaded = load_projects(dir.path()).expect("load");
        assert!(loaded[0].1.is_err());
        assert!(loaded[1].1.is_ok());
    }

    #[test]
    fn test_settings_defaults_and_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let base = TempDir::new().expect("temp dir");
        std::fs::create_dir(base.path().join(CONF_DIR)).expect("conf dir");
        write_file(
            &base.path().join(CONF_DIR),
            SETTINGS_FILE,
            "[mail]\nfrom = \"reports@example.com\"\n\n[retention.logs]\nmax_age = \"30d\"\nretain_count = 10\n",
        );

        std::env::set_var("DSR_GMAIL_REFRESH_TOKEN", "refresh-123");
        std::env::set_var("DSR_HTTP_TIMEOUT_SECS", "5");
        std::env::set_var("DSR_SMTP_PORT", "587");
        std::env::set_var("DSR_SMTP_TLS", "true");
        let settings = load_settings(base.path()).expect("settings");
        std::env::remove_var("DSR_GMAIL_REFRESH_TOKEN");
        std::env::remove_var("DSR_HTTP_TIMEOUT_SECS");
        std::env::remove_var("DSR_SMTP_PORT");
        std::env::remove_var("DSR_SMTP_TLS");

        assert_eq!(settings.mail.from, "reports@example.com");
        assert_eq!(settings.mail.gmail.refresh_token, "refresh-123");
        assert_eq!(settings.http.timeout_secs, 5);
        assert_eq!(settings.mail.smtp.server, "localhost");
        assert_eq!((settings.mail.smtp.port, settings.mail.smtp.tls), (587, true));
        assert_eq!(settings.retention.logs.retain_count, 10);
        assert_eq!(settings.retention.logs.max_age.to_string(), "30d");
        assert_eq!(settings.retention.reports, RetentionPolicy::default());
    }

    #[test]
    fn test_settings_file_is_optional() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let base = TempDir::new().expect("temp dir");
        let settings = load_settings(base.path()).expect("settings");
        assert_eq!(settings.mail.from, DEFAULT_MAIL_FROM);
        assert_eq!(settings.http.max_attempts, 3);
    }
}
