use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Config;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub server: Option<ServerConfig>,
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub docs_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub static_dir: Option<String>,
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub token_file: Option<String>,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Platform config directory path: `<config_dir>/snipdoc/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("snipdoc").join("config.toml"))
}

/// Load config by cascading CWD `.snipdoc.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".snipdoc.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_storage = base.storage.unwrap_or_default();
    let overlay_storage = overlay.storage.unwrap_or_default();
    let base_server = base.server.unwrap_or_default();
    let overlay_server = overlay.server.unwrap_or_default();
    let base_google = base.google.unwrap_or_default();
    let overlay_google = overlay.google.unwrap_or_default();

    ConfigFile {
        storage: Some(StorageConfig {
            docs_dir: overlay_storage.docs_dir.or(base_storage.docs_dir),
        }),
        server: Some(ServerConfig {
            bind: overlay_server.bind.or(base_server.bind),
            static_dir: overlay_server.static_dir.or(base_server.static_dir),
            max_upload_mb: overlay_server.max_upload_mb.or(base_server.max_upload_mb),
        }),
        google: Some(GoogleConfig {
            token_file: overlay_google.token_file.or(base_google.token_file),
            access_token: overlay_google.access_token.or(base_google.access_token),
            timeout_secs: overlay_google.timeout_secs.or(base_google.timeout_secs),
        }),
    }
}

/// Apply environment variable overrides on top of a file config.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a closure.
pub fn apply_env(mut file: ConfigFile, lookup: impl Fn(&str) -> Option<String>) -> ConfigFile {
    let storage = file.storage.get_or_insert_with(Default::default);
    if let Some(v) = lookup("SNIPDOC_DOCS_DIR") {
        storage.docs_dir = Some(v);
    }

    let server = file.server.get_or_insert_with(Default::default);
    if let Some(v) = lookup("SNIPDOC_BIND") {
        server.bind = Some(v);
    }
    if let Some(v) = lookup("SNIPDOC_STATIC_DIR") {
        server.static_dir = Some(v);
    }

    let google = file.google.get_or_insert_with(Default::default);
    if let Some(v) = lookup("GOOGLE_TOKEN_FILE") {
        google.token_file = Some(v);
    }
    if let Some(v) = lookup("GOOGLE_ACCESS_TOKEN") {
        google.access_token = Some(v);
    }
    if let Some(v) = lookup("GOOGLE_TIMEOUT").and_then(|v| v.parse().ok()) {
        google.timeout_secs = Some(v);
    }
    file
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        let defaults = Config::default();
        let storage = file.storage.unwrap_or_default();
        let server = file.server.unwrap_or_default();
        let google = file.google.unwrap_or_default();

        Config {
            docs_dir: storage
                .docs_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.docs_dir),
            bind: server.bind.unwrap_or(defaults.bind),
            static_dir: server.static_dir.map(PathBuf::from),
            max_upload_bytes: server
                .max_upload_mb
                .map(|mb| mb.saturating_mul(1024 * 1024))
                .unwrap_or(defaults.max_upload_bytes),
            google_token_file: google.token_file.map(PathBuf::from),
            google_access_token: google.access_token.filter(|t| !t.is_empty()),
            google_timeout_secs: google.timeout_secs.unwrap_or(defaults.google_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[storage]\ndocs_dir = \"/srv/docs\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.storage.unwrap().docs_dir.unwrap(), "/srv/docs");
        assert!(parsed.server.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            server: Some(ServerConfig {
                bind: Some("0.0.0.0:80".to_string()),
                max_upload_mb: Some(10),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            server: Some(ServerConfig {
                bind: Some("127.0.0.1:9000".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).server.unwrap();
        assert_eq!(merged.bind.unwrap(), "127.0.0.1:9000");
        assert_eq!(merged.max_upload_mb, Some(10));
    }

    #[test]
    fn env_overrides_file() {
        let file = ConfigFile {
            storage: Some(StorageConfig {
                docs_dir: Some("from_file".to_string()),
            }),
            ..Default::default()
        };
        let config: Config = apply_env(file, |key| match key {
            "SNIPDOC_DOCS_DIR" => Some("from_env".to_string()),
            "GOOGLE_TIMEOUT" => Some("5".to_string()),
            "GOOGLE_ACCESS_TOKEN" => Some(String::new()),
            _ => None,
        })
        .into();
        assert_eq!(config.docs_dir, PathBuf::from("from_env"));
        assert_eq!(config.google_timeout_secs, 5);
        assert!(config.google_access_token.is_none());
    }

    #[test]
    fn defaults_when_empty() {
        let config = Config::from(ConfigFile::default());
        assert_eq!(config.docs_dir, PathBuf::from("local_docs"));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.google_timeout_secs, 30);
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn huge_upload_limit_saturates() {
        let file = ConfigFile {
            server: Some(ServerConfig {
                max_upload_mb: Some(usize::MAX),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(Config::from(file).max_upload_bytes, usize::MAX);
    }

    #[test]
    fn debug_hides_access_token() {
        let config = Config {
            google_access_token: Some("secret".to_string()),
            ..Config::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("secret"));
    }
}
