use std::path::{Path, PathBuf};

/// Default data directory (relative to current working directory)
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Subdirectory paths relative to the data directory
pub const SNAPSHOTS_DIR: &str = "snapshots";
pub const LOGS_DIR: &str = "logs";

/// Filename of the persisted portfolio document
pub const PORTFOLIO_FILE: &str = "portfolio.json";

/// Helper struct to manage data paths
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths instance with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Data directory used when none is given on the command line:
    /// the platform-local data dir, falling back to ./data
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("stockfolio"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Get the root data directory
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Get the path of the persisted portfolio document
    pub fn portfolio_file(&self) -> PathBuf {
        self.root.join(PORTFOLIO_FILE)
    }

    /// Get the snapshots directory
    pub fn snapshots(&self) -> PathBuf {
        self.root.join(SNAPSHOTS_DIR)
    }

    /// Get the logs directory
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.snapshots())?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }
}
