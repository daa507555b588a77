//! Configuration validation
//!
//! Field ranges are declared on the blueprint types with `validator`; this
//! module runs them and adds the cross-field rules:
//! - vehicle and lidar ids distinct
//! - every float finite (timeouts, frequency, calibration, transforms)
//! - background channels in [0, 1]
//! - custom palette and class table buildable
//! - an explicit lidar blueprint delivers the configured modality

use colorizer::{ClassColorTable, Palette};
use contracts::{ContractError, SensorModality, SessionBlueprint, Transform};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a SessionBlueprint
///
/// Returns the first violation found, or Ok(()).
pub fn validate(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_ids(blueprint)?;
    validate_finite(blueprint)?;
    validate_viewer(blueprint)?;
    validate_colorization(blueprint)?;
    validate_lidar_blueprint(blueprint)?;
    Ok(())
}

/// Run the derived field rules
fn validate_fields(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let Err(errors) = blueprint.validate() else {
        return Ok(());
    };

    let mut violations = Vec::new();
    flatten_errors(&errors, "", &mut violations);
    // HashMap iteration order is random; report deterministically
    violations.sort();

    let (field, message) = violations
        .into_iter()
        .next()
        .unwrap_or_else(|| ("blueprint".to_string(), "invalid configuration".to_string()));
    Err(ContractError::config_validation(field, message))
}

fn flatten_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", error.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

/// Vehicle and lidar ids must be distinct
fn validate_ids(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    if blueprint.vehicle.id == blueprint.lidar.id {
        return Err(ContractError::config_validation(
            format!("lidar[id={}]", blueprint.lidar.id),
            "duplicate id: vehicle and lidar ids must be distinct",
        ));
    }
    Ok(())
}

fn ensure_finite(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("must be a finite number, got {value}"),
        ))
    }
}

fn ensure_finite_transform(field: &str, transform: &Transform) -> Result<(), ContractError> {
    let Transform { location, rotation } = transform;
    for (name, value) in [
        ("location.x", location.x),
        ("location.y", location.y),
        ("location.z", location.z),
        ("rotation.pitch", rotation.pitch),
        ("rotation.yaw", rotation.yaw),
        ("rotation.roll", rotation.roll),
    ] {
        ensure_finite(&format!("{field}.{name}"), value)?;
    }
    Ok(())
}

/// Ranges pass infinities; reject them here
fn validate_finite(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    ensure_finite("world.timeout_sec", blueprint.world.timeout_sec)?;
    ensure_finite("lidar.frequency_hz", blueprint.lidar.frequency_hz)?;
    ensure_finite(
        "colorization.attenuation_coefficient",
        blueprint.colorization.attenuation_coefficient,
    )?;
    ensure_finite(
        "colorization.reference_distance",
        blueprint.colorization.reference_distance,
    )?;
    ensure_finite("viewer.point_size", blueprint.viewer.point_size as f64)?;
    ensure_finite_transform("lidar.transform", &blueprint.lidar.transform)?;
    if let Some(spawn_point) = &blueprint.vehicle.spawn_point {
        ensure_finite_transform("vehicle.spawn_point", spawn_point)?;
    }
    Ok(())
}

fn validate_viewer(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let background = blueprint.viewer.background;
    if background.iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(ContractError::config_validation(
            "viewer.background",
            format!("channels must be in [0, 1], got {background:?}"),
        ));
    }
    Ok(())
}

/// Build the custom palette and class table once to surface their errors
fn validate_colorization(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let colorization = &blueprint.colorization;
    if let Some(stops) = &colorization.palette {
        Palette::from_rgb8(stops).map_err(|e| {
            ContractError::config_validation("colorization.palette", e.to_string())
        })?;
    }
    if let Some(entries) = &colorization.class_colors {
        ClassColorTable::from_rgb8(entries).map_err(|e| {
            ContractError::config_validation("colorization.class_colors", e.to_string())
        })?;
    }
    Ok(())
}

/// A blueprint override emitting the other record layout would make every
/// sweep undecodable
fn validate_lidar_blueprint(blueprint: &SessionBlueprint) -> Result<(), ContractError> {
    let lidar = &blueprint.lidar;
    let Some(custom) = &lidar.blueprint else {
        return Ok(());
    };
    let delivered = SensorModality::of_blueprint(custom);
    if delivered != lidar.modality {
        return Err(ContractError::config_validation(
            "lidar.blueprint",
            format!(
                "'{custom}' delivers {delivered} records but lidar.modality is {}",
                lidar.modality
            ),
        ));
    }
    Ok(())
}
