use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    /// Member name of the host HA process, used in log lines
    #[serde(default = "default_node_name")]
    pub name: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            log_dir: default_log_dir(),
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("node.name cannot be empty".into()));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("node.log_dir cannot be empty".into()));
        }
        Ok(())
    }
}

fn default_node_name() -> String {
    "postgres0".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
