use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    RepCounterError,
    pose::{
        Arm, JointExtractor, RepThresholds,
        extractor::DEFAULT_MIN_VISIBILITY,
        rep_counter::{DEFAULT_EXTENDED_THRESHOLD, DEFAULT_FLEXED_THRESHOLD},
    },
};

const CONFIG_DIR_NAME: &str = "repcounter";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub extended_threshold: f64,
    pub flexed_threshold: f64,
    pub min_visibility: f32,
    pub arm: Arm,
    pub smoothing: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extended_threshold: DEFAULT_EXTENDED_THRESHOLD,
            flexed_threshold: DEFAULT_FLEXED_THRESHOLD,
            min_visibility: DEFAULT_MIN_VISIBILITY,
            arm: Arm::default(),
            smoothing: false,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, RepCounterError> {
        Ok(dirs::config_dir()
            .ok_or(RepCounterError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// The user's saved configuration, `None` if nothing was saved yet.
    pub fn from_local_file() -> Result<Option<Self>, RepCounterError> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::from_path(&config_path).map(Some)
        } else {
            debug!("No config file at {:?}", config_path);
            Ok(None)
        }
    }

    pub fn from_path(config_path: &Path) -> Result<Self, RepCounterError> {
        let file = std::fs::File::open(config_path)
            .map_err(|e| RepCounterError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| RepCounterError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), RepCounterError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), RepCounterError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| RepCounterError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| RepCounterError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RepCounterError::ConfigSerializeError { source: e })
    }

    pub fn thresholds(&self) -> Result<RepThresholds, RepCounterError> {
        RepThresholds::new(self.extended_threshold, self.flexed_threshold)
    }

    pub fn extractor(&self) -> JointExtractor {
        JointExtractor::new(self.arm, self.min_visibility)
    }
}
