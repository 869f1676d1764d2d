// Configuration loading and parsing (config/client.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single client config file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "client.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub skins: SkinConfig,
}

/// Where the game server lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Scheme, host and port, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Servlet context path prefixed to every endpoint, e.g. `/Oh_Mock`.
    #[serde(default)]
    pub context_path: String,
    /// WebSocket endpoint below the context path. SockJS brokers expose the
    /// raw socket at `<endpoint>/websocket`.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ws_path() -> String {
    "/ws/websocket".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl ServerConfig {
    /// Base URL for REST calls: `base_url` + `context_path`, no trailing slash.
    pub fn http_base(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.context_path.trim_end_matches('/')
        )
    }

    /// WebSocket URL of the STOMP endpoint (`ws://` or `wss://`).
    pub fn ws_url(&self) -> String {
        let base = self.http_base();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base
        };
        format!("{ws_base}{}", self.ws_path)
    }

    /// Host name sent in the STOMP `CONNECT` frame.
    pub fn host(&self) -> String {
        let after_scheme = self
            .base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(self.base_url.as_str());
        let authority = after_scheme.split('/').next().unwrap_or_default();
        authority
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(authority)
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_render_fps")]
    pub render_fps: u32,
    /// How long the victory celebration stays on screen.
    #[serde(default = "default_celebration_secs")]
    pub celebration_secs: u64,
    /// Chat lines kept before the oldest are dropped.
    #[serde(default = "default_chat_history")]
    pub chat_history: usize,
}

fn default_render_fps() -> u32 {
    30
}

fn default_celebration_secs() -> u64 {
    2
}

fn default_chat_history() -> usize {
    200
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            render_fps: default_render_fps(),
            celebration_secs: default_celebration_secs(),
            chat_history: default_chat_history(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkinConfig {
    /// Shown in place of a skin that is missing or fails to load.
    #[serde(default = "default_placeholder")]
    pub placeholder_url: String,
    /// Check each new skin URL with a GET before trusting it.
    #[serde(default = "default_probe")]
    pub probe: bool,
}

fn default_placeholder() -> String {
    "https://via.placeholder.com/40/000000/FFFFFF?text=?".to_string()
}

fn default_probe() -> bool {
    true
}

impl Default for SkinConfig {
    fn default() -> Self {
        SkinConfig {
            placeholder_url: default_placeholder(),
            probe: default_probe(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/client.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy `defaults/client.toml` to `config/client.toml` unless the user
/// already has one. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor {} found; run from the project root",
                target.display(),
                source.display()
            ),
        });
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", parent.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config file first if it is missing.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(path) = ensure_config_file(&cwd)? {
        tracing::info!("created {} from defaults", path.display());
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let server = &config.server;
    if !(server.base_url.starts_with("http://") || server.base_url.starts_with("https://")) {
        return Err(invalid(
            "server.base_url",
            format!("must start with http:// or https://, got {:?}", server.base_url),
        ));
    }
    if !server.context_path.is_empty() && !server.context_path.starts_with('/') {
        return Err(invalid("server.context_path", "must be empty or start with '/'"));
    }
    if !server.ws_path.starts_with('/') {
        return Err(invalid("server.ws_path", "must start with '/'"));
    }
    if server.request_timeout_secs == 0 {
        return Err(invalid("server.request_timeout_secs", "must be greater than 0"));
    }

    let ui = &config.ui;
    if !(1..=120).contains(&ui.render_fps) {
        return Err(invalid(
            "ui.render_fps",
            format!("must be between 1 and 120, got {}", ui.render_fps),
        ));
    }
    if ui.chat_history == 0 {
        return Err(invalid("ui.chat_history", "must be greater than 0"));
    }

    if config.skins.placeholder_url.trim().is_empty() {
        return Err(invalid("skins.placeholder_url", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
    }

    fn write_config(dir_name: &str, toml_text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(dir_name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), toml_text).unwrap();
        tmp
    }

    fn expect_invalid(dir_name: &str, toml_text: &str, expected_field: &str) {
        let tmp = write_config(dir_name, toml_text);
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shipped_defaults_are_valid() {
        let path = project_root().join("defaults").join(CONFIG_FILE);
        let text = fs::read_to_string(&path).unwrap();
        let config = parse_config(&text, &path).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.server.context_path, "/Oh_Mock");
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let tmp = write_config(
            "gomoku_config_minimal",
            "[server]\nbase_url = \"http://example.com:9000\"\n",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.server.ws_path, "/ws/websocket");
        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.ui.render_fps, 30);
        assert_eq!(config.ui.celebration_secs, 2);
        assert!(config.skins.probe);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn urls_derived_from_server_section() {
        let server = ServerConfig {
            base_url: "https://game.example:8443/".into(),
            context_path: "/Oh_Mock".into(),
            ws_path: "/ws/websocket".into(),
            request_timeout_secs: 5,
        };
        assert_eq!(server.http_base(), "https://game.example:8443/Oh_Mock");
        assert_eq!(server.ws_url(), "wss://game.example:8443/Oh_Mock/ws/websocket");
        assert_eq!(server.host(), "game.example");
    }

    #[test]
    fn plain_http_becomes_ws() {
        let server = ServerConfig {
            base_url: "http://localhost".into(),
            context_path: String::new(),
            ws_path: "/ws/websocket".into(),
            request_timeout_secs: 5,
        };
        assert_eq!(server.ws_url(), "ws://localhost/ws/websocket");
        assert_eq!(server.host(), "localhost");
    }

    #[test]
    fn rejects_non_http_base_url() {
        expect_invalid(
            "gomoku_config_bad_url",
            "[server]\nbase_url = \"localhost:8080\"\n",
            "server.base_url",
        );
    }

    #[test]
    fn rejects_relative_context_path() {
        expect_invalid(
            "gomoku_config_bad_context",
            "[server]\nbase_url = \"http://localhost\"\ncontext_path = \"Oh_Mock\"\n",
            "server.context_path",
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        expect_invalid(
            "gomoku_config_zero_timeout",
            "[server]\nbase_url = \"http://localhost\"\nrequest_timeout_secs = 0\n",
            "server.request_timeout_secs",
        );
    }

    #[test]
    fn rejects_render_fps_out_of_range() {
        expect_invalid(
            "gomoku_config_fps",
            "[server]\nbase_url = \"http://localhost\"\n[ui]\nrender_fps = 0\n",
            "ui.render_fps",
        );
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("gomoku_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = write_config("gomoku_config_parse", "[server\nbase_url = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_copies_default() {
        let tmp = std::env::temp_dir().join("gomoku_config_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "x = 1").unwrap();
        fs::write(tmp.join("defaults").join("other.toml"), "y = 2").unwrap();

        let copied = ensure_config_file(&tmp).unwrap();
        assert_eq!(copied, Some(tmp.join("config").join(CONFIG_FILE)));
        assert_eq!(fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(), "x = 1");
        assert!(!tmp.join("config").join("other.toml").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_keeps_existing() {
        let tmp = std::env::temp_dir().join("gomoku_config_skip");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "from = \"defaults\"").unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), "from = \"user\"").unwrap();

        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let kept = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert!(kept.contains("user"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_needs_no_defaults_when_config_exists() {
        let tmp = write_config("gomoku_config_no_defaults", "from = \"user\"");
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_errors_when_both_missing() {
        let tmp = std::env::temp_dir().join("gomoku_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_file(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
