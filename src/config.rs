use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Directory holding the per-session duplicate exports
    pub export_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
    pub sweep: SweepConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            export_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origin: None,
            sweep: SweepConfig::default(),
        }
    }
}

/// Reclaiming of export files that no session will download again.
/// Disabled unless `retention_secs` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub retention_secs: Option<u64>,
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            retention_secs: None,
            interval_secs: 300,
        }
    }
}

impl SweepConfig {
    pub fn retention(&self) -> Option<Duration> {
        self.retention_secs.map(Duration::from_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl ServerConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load from a YAML file, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml;

    #[test]
    fn test_serialization() {
        let config = ServerConfig {
            export_dir: PathBuf::from("/var/lib/dupcheck"),
            sweep: SweepConfig {
                retention_secs: Some(3600),
                interval_secs: 60,
            },
            ..ServerConfig::default()
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("export_dir: /var/lib/dupcheck"));
        assert!(yaml.contains("retention_secs: 3600"));
    }

    #[test]
    fn test_deserialization() {
        let yaml = r#"
port: 8080
export_dir: "exports"
sweep:
  retention_secs: 900
"#;

        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.export_dir, PathBuf::from("exports"));
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.sweep.retention(), Some(Duration::from_secs(900)));
        assert_eq!(config.sweep.interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_defaults_without_file() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listen_address(), "0.0.0.0:3000");
        assert_eq!(config.sweep.retention(), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ServerConfig::load(Some(Path::new("/nonexistent/dupcheck.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
