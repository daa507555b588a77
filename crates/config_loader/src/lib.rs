//! Reads a session file into a validated [`SessionBlueprint`].
//!
//! The format follows the file extension (`.toml` or `.json`). Parsing fills
//! every omitted field with its default, then the blueprint is checked for
//! out-of-range values, non-finite numbers and clashing actor ids before it
//! is handed to the session.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("session.toml"))?;
//! println!("LiDAR: {} ({})", blueprint.lidar.id, blueprint.lidar.modality);
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod parser;
mod validator;

pub use contracts::SessionBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a session file.
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ContractError> {
        let extension = path.extension().and_then(|e| e.to_str());
        let format = extension
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| ContractError::UnsupportedFormat {
                extension: extension.map(str::to_string),
            })?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Re-check a blueprint that was edited after loading, e.g. by CLI flags.
    pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint).map_err(|e| ContractError::config_serialize("TOML", e))
    }

    pub fn to_json(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_serialize("JSON", e))
    }
}
