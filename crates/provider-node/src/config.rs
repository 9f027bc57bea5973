// provider-node/src/config.rs
use provider_core::{Params, UpgradeSchedule};
use provider_store::SledConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: String,
    /// Decoded provider records kept per block context
    pub cache_capacity: usize,
    pub storage: SledConfig,
    pub upgrades: UpgradeSchedule,
    pub params: Params,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            cache_capacity: 1024,
            storage: SledConfig {
                path: "providers".into(),
                ..SledConfig::default()
            },
            upgrades: UpgradeSchedule::default(),
            params: Params::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.params.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Genesis ledger balances saved by `load-genesis`
    pub fn ledger_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("ledger.json")
    }

    /// Sled path, relative paths resolved under `data_dir`
    pub fn store_config(&self) -> SledConfig {
        let path = Path::new(&self.storage.path);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.data_dir).join(path)
        };
        SledConfig {
            path: path.to_string_lossy().into_owned(),
            ..self.storage.clone()
        }
    }
}
