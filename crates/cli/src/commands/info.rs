//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{SensorModality, SessionBlueprint, Transform, WeatherParams};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    world: WorldInfo,
    vehicle: VehicleInfo,
    lidar: LidarInfo,
    viewer: ViewerInfo,
    colorization: ColorizationInfo,
}

#[derive(Serialize)]
struct WorldInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<String>,
    carla_host: String,
    carla_port: u16,
    timeout_sec: f64,
    synchronous_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    weather: Option<WeatherParams>,
}

#[derive(Serialize)]
struct VehicleInfo {
    id: String,
    blueprint: String,
    autopilot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    spawn_point: Option<Transform>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    attributes: HashMap<String, String>,
}

#[derive(Serialize)]
struct LidarInfo {
    id: String,
    blueprint: String,
    modality: SensorModality,
    frequency_hz: f64,
    transform: Transform,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    attributes: HashMap<String, String>,
}

#[derive(Serialize)]
struct ViewerInfo {
    window_name: String,
    width: u32,
    height: u32,
    point_size: f32,
    tick_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_frames: Option<u64>,
}

#[derive(Serialize)]
struct ColorizationInfo {
    attenuation_coefficient: f64,
    reference_distance: f64,
    palette: String,
    class_colors: String,
    shade_by_incidence: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn palette_desc(blueprint: &SessionBlueprint) -> String {
    match &blueprint.colorization.palette {
        Some(stops) => format!("custom ({} stops)", stops.len()),
        None => "plasma".to_string(),
    }
}

fn class_colors_desc(blueprint: &SessionBlueprint) -> String {
    match &blueprint.colorization.class_colors {
        Some(_) => "custom".to_string(),
        None => "cityscapes".to_string(),
    }
}

fn build_config_info(blueprint: &SessionBlueprint, args: &InfoArgs) -> ConfigInfo {
    let attributes = |attrs: &HashMap<String, String>| {
        if args.attributes {
            attrs.clone()
        } else {
            HashMap::new()
        }
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        world: WorldInfo {
            map: blueprint.world.map.clone(),
            carla_host: blueprint.world.carla_host.clone(),
            carla_port: blueprint.world.carla_port,
            timeout_sec: blueprint.world.timeout_sec,
            synchronous_mode: blueprint.world.synchronous_mode,
            weather: blueprint.world.weather.as_ref().map(|w| w.params()),
        },
        vehicle: VehicleInfo {
            id: blueprint.vehicle.id.clone(),
            blueprint: blueprint.vehicle.blueprint.clone(),
            autopilot: blueprint.vehicle.autopilot,
            spawn_point: blueprint.vehicle.spawn_point,
            attributes: attributes(&blueprint.vehicle.attributes),
        },
        lidar: LidarInfo {
            id: blueprint.lidar.id.clone(),
            blueprint: blueprint.lidar.blueprint().to_string(),
            modality: blueprint.lidar.modality,
            frequency_hz: blueprint.lidar.frequency_hz,
            transform: blueprint.lidar.transform,
            attributes: attributes(&blueprint.lidar.attributes),
        },
        viewer: ViewerInfo {
            window_name: blueprint.viewer.window_name.clone(),
            width: blueprint.viewer.width,
            height: blueprint.viewer.height,
            point_size: blueprint.viewer.point_size,
            tick_interval_ms: blueprint.viewer.tick_interval_ms,
            max_frames: blueprint.viewer.max_frames,
        },
        colorization: ColorizationInfo {
            attenuation_coefficient: blueprint.colorization.attenuation_coefficient,
            reference_distance: blueprint.colorization.reference_distance,
            palette: palette_desc(blueprint),
            class_colors: class_colors_desc(blueprint),
            shade_by_incidence: blueprint.colorization.shade_by_incidence,
        },
    }
}

fn print_attributes(indent: &str, attributes: &HashMap<String, String>) {
    let mut keys: Vec<_> = attributes.keys().collect();
    keys.sort();
    for (i, key) in keys.iter().enumerate() {
        let prefix = if i == keys.len() - 1 { "└─" } else { "├─" };
        println!("{indent}{prefix} {key} = {}", attributes[*key]);
    }
}

fn print_config_info(blueprint: &SessionBlueprint, args: &InfoArgs) {
    println!("=== LiDAR Viewer Session ===\n");

    let world = &blueprint.world;
    println!("World");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Map: {}", world.map.as_deref().unwrap_or("(current)"));
    println!(
        "   ├─ CARLA Server: {}:{} (timeout {}s)",
        world.carla_host, world.carla_port, world.timeout_sec
    );
    println!("   ├─ Synchronous mode: {}", world.synchronous_mode);
    match &world.weather {
        Some(weather) => println!("   └─ Weather: {:?}", weather),
        None => println!("   └─ Weather: Default"),
    }

    let vehicle = &blueprint.vehicle;
    println!("\nVehicle");
    println!("   ├─ {} ({})", vehicle.id, vehicle.blueprint);
    match &vehicle.spawn_point {
        Some(t) => println!(
            "   ├─ Spawn: ({:.1}, {:.1}, {:.1})",
            t.location.x, t.location.y, t.location.z
        ),
        None => println!("   ├─ Spawn: backend choice"),
    }
    println!("   └─ Autopilot: {}", vehicle.autopilot);
    if args.attributes && !vehicle.attributes.is_empty() {
        print_attributes("      ", &vehicle.attributes);
    }

    let lidar = &blueprint.lidar;
    let location = lidar.transform.location;
    println!("\nLiDAR");
    println!("   ├─ {} ({})", lidar.id, lidar.blueprint());
    println!("   ├─ Modality: {}", lidar.modality);
    println!(
        "   ├─ Mount: ({:.2}, {:.2}, {:.2})",
        location.x, location.y, location.z
    );
    println!("   └─ Frequency: {} Hz", lidar.frequency_hz);
    if args.attributes && !lidar.attributes.is_empty() {
        print_attributes("      ", &lidar.attributes);
    }

    let viewer = &blueprint.viewer;
    println!("\nViewer");
    println!(
        "   ├─ Window: {} {}x{} at ({}, {})",
        viewer.window_name, viewer.width, viewer.height, viewer.left, viewer.top
    );
    println!(
        "   ├─ Point size: {}, axes: {}",
        viewer.point_size, viewer.show_axes
    );
    println!(
        "   └─ Tick: {} ms, max frames: {}",
        viewer.tick_interval_ms,
        viewer
            .max_frames
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );

    let colors = &blueprint.colorization;
    println!("\nColorization");
    println!(
        "   ├─ Attenuation: {} (reference distance {})",
        colors.attenuation_coefficient, colors.reference_distance
    );
    println!("   ├─ Invalid intensity: {:?}", colors.invalid_intensity);
    println!("   ├─ Palette: {}", palette_desc(blueprint));
    println!("   ├─ Class colors: {}", class_colors_desc(blueprint));
    println!("   └─ Shade by incidence: {}", colors.shade_by_incidence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SESSION_TOML: &str = r#"
[world]
map = "Town10HD"
weather = "rainy_noon"

[vehicle]
id = "ego"
[vehicle.attributes]
role_name = "hero"

[lidar]
id = "roof_lidar"
modality = "semantic"
[lidar.attributes]
channels = "64"
"#;

    fn args(config: PathBuf, attributes: bool) -> InfoArgs {
        InfoArgs {
            config,
            json: true,
            attributes,
        }
    }

    fn load() -> SessionBlueprint {
        config_loader::ConfigLoader::load_from_str(SESSION_TOML, config_loader::ConfigFormat::Toml)
            .unwrap()
    }

    #[test]
    fn test_build_config_info() {
        let blueprint = load();
        let info = build_config_info(&blueprint, &args(PathBuf::new(), false));

        assert_eq!(info.world.map.as_deref(), Some("Town10HD"));
        assert_eq!(info.world.weather.as_ref().map(|w| w.precipitation), Some(60.0));
        assert_eq!(info.lidar.blueprint, "sensor.lidar.ray_cast_semantic");
        assert!(info.lidar.attributes.is_empty());
        assert_eq!(info.colorization.palette, "plasma");
        assert_eq!(info.colorization.class_colors, "cityscapes");
    }

    #[test]
    fn test_attributes_flag() {
        let blueprint = load();
        let info = build_config_info(&blueprint, &args(PathBuf::new(), true));
        assert_eq!(info.lidar.attributes.get("channels").map(String::as_str), Some("64"));
        assert_eq!(
            info.vehicle.attributes.get("role_name").map(String::as_str),
            Some("hero")
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["lidar"]["modality"], "semantic");
    }

    #[test]
    fn test_run_info_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, SESSION_TOML).unwrap();

        assert!(run_info(&args(path.clone(), true)).is_ok());
        assert!(run_info(&InfoArgs {
            config: path,
            json: false,
            attributes: true,
        })
        .is_ok());
        assert!(run_info(&args(dir.path().join("missing.toml"), false)).is_err());
    }
}
