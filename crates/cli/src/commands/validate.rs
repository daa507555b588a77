//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{SensorModality, SessionBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    carla: String,
    vehicle: String,
    lidar: String,
    lidar_blueprint: String,
    modality: SensorModality,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    carla: format!(
                        "{}:{}",
                        blueprint.world.carla_host, blueprint.world.carla_port
                    ),
                    vehicle: blueprint.vehicle.id.clone(),
                    lidar: blueprint.lidar.id.clone(),
                    lidar_blueprint: blueprint.lidar.blueprint().to_string(),
                    modality: blueprint.lidar.modality,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(ref palette) = blueprint.colorization.palette {
        if palette.len() < 3 {
            warnings.push(format!(
                "custom palette has only {} stops - intensity gradient will be coarse",
                palette.len()
            ));
        }
    }

    if blueprint.lidar.modality == SensorModality::Intensity
        && blueprint.colorization.class_colors.is_some()
    {
        warnings.push("class_colors is set but the lidar uses intensity modality".to_string());
    }

    if blueprint.world.synchronous_mode {
        warnings.push(
            "world.synchronous_mode is enabled - the viewer does not tick the world".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  CARLA: {}", summary.carla);
            println!("  Vehicle: {}", summary.vehicle);
            println!(
                "  LiDAR: {} ({}, {})",
                summary.lidar, summary.lidar_blueprint, summary.modality
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SEMANTIC_TOML: &str = r#"
[world]

[vehicle]
id = "ego"

[lidar]
id = "roof_lidar"
modality = "semantic"
blueprint = "sensor.lidar.ray_cast_semantic"

[colorization]
palette = [[0, 0, 0], [255, 255, 255]]
"#;

    fn load(content: &str) -> SessionBlueprint {
        config_loader::ConfigLoader::load_from_str(content, config_loader::ConfigFormat::Toml)
            .unwrap()
    }

    #[test]
    fn test_collect_warnings() {
        let warnings = collect_warnings(&load(SEMANTIC_TOML));
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("only 2 stops"));
    }

    #[test]
    fn test_no_warnings_for_defaults() {
        let blueprint = load("[world]\n[vehicle]\nid = \"ego\"\n[lidar]\nid = \"lidar\"\n");
        assert!(collect_warnings(&blueprint).is_empty());
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, SEMANTIC_TOML).unwrap();

        let args = ValidateArgs {
            config: path,
            json: true,
        };
        let result = validate_config(&args);
        assert!(result.valid);
        assert_eq!(result.warnings.as_ref().map(Vec::len), Some(1));
        assert!(run_validate(&args).is_ok());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "[world]\n[vehicle]\nid = \"x\"\n[lidar]\nid = \"x\"\n").unwrap();

        let args = ValidateArgs {
            config: path,
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("duplicate id"));
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_blueprint_modality_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(
            &path,
            SEMANTIC_TOML.replace("ray_cast_semantic", "ray_cast"),
        )
        .unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("lidar.blueprint"));
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: PathBuf::from("/nonexistent/session.toml"),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
