//! CLI configuration
//!
//! Settings come from, in increasing priority: built-in defaults, a JSON
//! file (`--config`, or `baas.json` when present), then flags and their
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use baas_provider_ibm::{Auth, ClientConfig, DEFAULT_IAM_URL};
use baas_state::BackendConfig;
use clap::Args;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "baas.json";

/// Connection and state flags shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Path to a JSON configuration file
    #[arg(long, global = true, env = "BAAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backup & Recovery endpoint URL
    #[arg(long, global = true, env = "BAAS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Tenant id sent as X-IBM-Tenant-Id
    #[arg(long, global = true, env = "BAAS_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// IBM Cloud API key, exchanged for a token at the IAM endpoint
    #[arg(long, global = true, env = "IBMCLOUD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bearer token used as is (takes precedence over the API key)
    #[arg(long, global = true, env = "BAAS_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// IAM endpoint URL
    #[arg(long, global = true, env = "BAAS_IAM_URL")]
    pub iam_url: Option<String>,

    /// Path to the local state file
    #[arg(long = "state", global = true, env = "BAAS_STATE")]
    pub state_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub endpoint: Option<String>,
    pub tenant_id: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub iam_url: String,
    pub state_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            tenant_id: None,
            api_key: None,
            bearer_token: None,
            iam_url: DEFAULT_IAM_URL.to_string(),
            state_path: PathBuf::from("baas.state.json"),
        }
    }
}

impl Config {
    /// Merge defaults, the config file and the flags
    pub fn load(args: &ConfigArgs) -> Result<Self, String> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.merge(args);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn merge(&mut self, args: &ConfigArgs) {
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(tenant_id) = &args.tenant_id {
            self.tenant_id = Some(tenant_id.clone());
        }
        if let Some(api_key) = &args.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(token) = &args.bearer_token {
            self.bearer_token = Some(token.clone());
        }
        if let Some(iam_url) = &args.iam_url {
            self.iam_url = iam_url.clone();
        }
        if let Some(state_path) = &args.state_path {
            self.state_path = state_path.clone();
        }
    }

    /// Settings of the API client; fails when a required one is missing
    pub fn client_config(&self) -> Result<ClientConfig, String> {
        let endpoint = non_empty(&self.endpoint)
            .ok_or("endpoint is not set (use --endpoint or BAAS_ENDPOINT)")?;
        let tenant_id = non_empty(&self.tenant_id)
            .ok_or("tenant id is not set (use --tenant-id or BAAS_TENANT_ID)")?;

        let auth = match (non_empty(&self.bearer_token), non_empty(&self.api_key)) {
            (Some(token), _) => Auth::BearerToken(token.to_string()),
            (None, Some(api_key)) => Auth::IamApiKey {
                api_key: api_key.to_string(),
                iam_url: self.iam_url.clone(),
            },
            (None, None) => {
                return Err(
                    "no credentials: set IBMCLOUD_API_KEY or BAAS_BEARER_TOKEN".to_string(),
                );
            }
        };

        Ok(ClientConfig {
            endpoint: endpoint.to_string(),
            tenant_id: tenant_id.to_string(),
            auth,
        })
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::local(self.state_path.to_string_lossy())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("baas.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.iam_url, "https://iam.cloud.ibm.com");
        assert_eq!(config.state_path, PathBuf::from("baas.state.json"));
        assert!(config.client_config().is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"endpoint": "https://file.example", "tenant_id": "t-file", "api_key": "k"}"#,
        );
        let args = ConfigArgs {
            config: Some(path),
            endpoint: Some("https://flag.example".to_string()),
            ..Default::default()
        };

        let config = Config::load(&args).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://flag.example"));
        assert_eq!(config.tenant_id.as_deref(), Some("t-file"));
        assert_eq!(config.iam_url, DEFAULT_IAM_URL);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let args = ConfigArgs {
            config: Some(dir.path().join("absent.json")),
            ..Default::default()
        };
        assert!(Config::load(&args).unwrap_err().contains("Failed to read"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"endpont": "https://typo.example"}"#);
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn bearer_token_wins_over_api_key() {
        let config = Config {
            endpoint: Some("https://b.example".to_string()),
            tenant_id: Some("t".to_string()),
            api_key: Some("k".to_string()),
            bearer_token: Some("tok".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.client_config().unwrap().auth,
            Auth::BearerToken("tok".to_string())
        );

        let config = Config {
            bearer_token: Some("  ".to_string()),
            ..config
        };
        assert_eq!(
            config.client_config().unwrap().auth,
            Auth::IamApiKey {
                api_key: "k".to_string(),
                iam_url: DEFAULT_IAM_URL.to_string(),
            }
        );
    }

    #[test]
    fn missing_tenant_is_reported() {
        let config = Config {
            endpoint: Some("https://b.example".to_string()),
            bearer_token: Some("tok".to_string()),
            ..Default::default()
        };
        assert!(config.client_config().unwrap_err().contains("tenant id"));
    }
}
