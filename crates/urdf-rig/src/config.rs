//! Import configuration
//!
//! [`ImportOptions`] can be built in code or loaded from a RON file. Missing
//! fields take their default values.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Environment variable whose first entry is used as the share root
pub const PACKAGE_PATH_VAR: &str = "ROS_PACKAGE_PATH";

/// Share root taken from the environment, read once per process
static ENV_SHARE_ROOT: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let value = std::env::var_os(PACKAGE_PATH_VAR)?;
    std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty())
});

/// How joints declaring several nonzero axis components are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisPolicy {
    /// Configure the first nonzero component in x, y, z order and warn
    #[default]
    FirstNonZero,
    /// Abort the import
    Reject,
}

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Options controlling a robot import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Directory substituted for the `package://` prefix of mesh and texture
    /// references
    pub share_root: Option<PathBuf>,
    /// Length given to every bone; only there so the host accepts the bone
    pub bone_epsilon: f32,
    /// Scale of the marker empties created for visuals without geometry
    pub marker_scale: f32,
    pub axis_policy: AxisPolicy,
    /// Instantiate the base link's visual and parent it to the armature
    pub base_link_visuals: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            share_root: ENV_SHARE_ROOT.clone(),
            bone_epsilon: 1e-5,
            marker_scale: 0.01,
            axis_policy: AxisPolicy::default(),
            base_link_visuals: true,
        }
    }
}

impl ImportOptions {
    pub fn with_share_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.share_root = Some(root.into());
        self
    }

    pub fn with_axis_policy(mut self, policy: AxisPolicy) -> Self {
        self.axis_policy = policy;
        self
    }

    /// Parse options from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Load options from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let options = Self::from_ron(&content)?;
        tracing::info!("Loaded import options from {:?}", path);
        Ok(options)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save options to a RON file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, self.to_ron()?).map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::info!("Saved import options to {:?}", path);
        Ok(())
    }
}
