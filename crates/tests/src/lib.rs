//! # Integration Tests
//!
//! Cross-crate tests with mock collaborators; no CARLA server or display needed.
//!
//! Covers:
//! - Contract snapshots
//! - Mock sensor -> acquisition -> store -> render loop -> recording viewer
//! - Actor lifecycle with injected failures

#[cfg(test)]
mod contract_tests {
    use contracts::{IntensityPoint, LidarRecord, SemanticClass, SemanticPoint, SensorModality};

    #[test]
    fn test_record_layouts() {
        assert_eq!(IntensityPoint::RECORD_SIZE, 16);
        assert_eq!(SemanticPoint::RECORD_SIZE, 24);
        assert_eq!(IntensityPoint::MODALITY, SensorModality::Intensity);
        assert_eq!(SemanticPoint::MODALITY, SensorModality::Semantic);
    }

    #[test]
    fn test_semantic_classes() {
        assert_eq!(SemanticClass::ALL.len(), SemanticClass::COUNT);
        assert_eq!(SemanticClass::from_tag(7).map(SemanticClass::name), Some("road"));
        assert_eq!(SemanticClass::from_tag(34), None);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::mock_sensor::synthesize_scan;
    use actor_factory::{MockSensor, MockSensorConfig};
    use bytes::Bytes;
    use colorizer::{ClassColorTable, ColorScheme};
    use contracts::{
        IntensityPoint, SemanticPoint, SensorModality, SensorPacket, SensorSource, ShutdownSignal,
    };
    use ingestion::AcquisitionCallback;
    use point_store::{PointCloud, PointCloudStore};
    use viewer::{
        RecordingViewer, RenderLoop, RenderLoopConfig, TerminationReason, Viewer, ViewerCall,
        WindowOptions,
    };

    fn scan_config() -> MockSensorConfig {
        MockSensorConfig {
            frequency_hz: 200.0,
            points_per_scan: 512,
            ..Default::default()
        }
    }

    fn packet(modality: SensorModality, payload: Bytes, frame_id: u64) -> SensorPacket {
        SensorPacket {
            sensor_id: "roof_lidar".into(),
            modality,
            timestamp: frame_id as f64 * 0.1,
            frame_id: Some(frame_id),
            payload,
        }
    }

    fn callback(
        modality: SensorModality,
        store: &Arc<PointCloudStore>,
        shutdown: &ShutdownSignal,
    ) -> AcquisitionCallback {
        AcquisitionCallback::new(
            "roof_lidar".into(),
            modality,
            Arc::new(ColorScheme::default()),
            Arc::clone(store),
            shutdown.clone(),
        )
    }

    /// Semantic scan: positions flipped on y, colors straight from the class table
    #[test]
    fn test_semantic_scan_end_to_end() {
        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let acquisition = callback(SensorModality::Semantic, &store, &shutdown);

        let payload = synthesize_scan(&scan_config(), SensorModality::Semantic, 3);
        let records = ingestion::decode::<SemanticPoint>(&payload).unwrap();
        let published = acquisition
            .process(&packet(SensorModality::Semantic, payload, 3))
            .unwrap();

        assert_eq!(published.points, records.len());
        let cloud = store.read();
        let table = ClassColorTable::cityscapes();
        for (record, (position, color)) in records.iter().zip(cloud.iter()) {
            assert_eq!(*position, [record.x, -record.y, record.z]);
            assert_eq!(*color, table.lookup(record.object_tag).unwrap());
        }
    }

    /// Intensity scan: every color comes from the intensity strategy
    #[test]
    fn test_intensity_scan_end_to_end() {
        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let acquisition = callback(SensorModality::Intensity, &store, &shutdown);
        let scheme = ColorScheme::default();

        let payload = synthesize_scan(&scan_config(), SensorModality::Intensity, 0);
        let records = ingestion::decode::<IntensityPoint>(&payload).unwrap();
        acquisition
            .process(&packet(SensorModality::Intensity, payload, 0))
            .unwrap();

        let cloud = store.read();
        assert_eq!(cloud.len(), records.len());
        for (record, color) in records.iter().zip(cloud.colors()) {
            assert_eq!(*color, scheme.intensity.color(record.intensity).unwrap());
            for channel in color.to_array() {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn test_bad_ticks_keep_previous_cloud() {
        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let acquisition = callback(SensorModality::Semantic, &store, &shutdown);
        let metrics = acquisition.metrics();

        let good = synthesize_scan(&scan_config(), SensorModality::Semantic, 1);
        acquisition.on_packet(packet(SensorModality::Semantic, good, 1));
        let generation = store.generation();
        let points = store.read().len();

        // Not a multiple of 24 bytes
        acquisition.on_packet(packet(
            SensorModality::Semantic,
            Bytes::from(vec![0_u8; 25]),
            2,
        ));
        // Wrong record layout for this callback
        let intensity = synthesize_scan(&scan_config(), SensorModality::Intensity, 3);
        acquisition.on_packet(packet(SensorModality::Intensity, intensity, 3));

        assert_eq!(store.generation(), generation);
        assert_eq!(store.read().len(), points);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.buffers_received, 3);
        assert_eq!(snapshot.clouds_published, 1);
        assert_eq!(snapshot.ticks_skipped, 2);
        assert!(!shutdown.is_requested());
    }

    /// Mock sensor thread -> callback -> store -> render loop -> viewer
    #[tokio::test]
    async fn test_mock_sensor_to_recording_viewer() {
        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let expected_points = synthesize_scan(&scan_config(), SensorModality::Semantic, 0).len()
            / SensorModality::Semantic.record_size();

        let sensor = MockSensor::new("roof_lidar".into(), SensorModality::Semantic, scan_config());
        sensor.listen(callback(SensorModality::Semantic, &store, &shutdown).into_callback());

        let mut viewer = RecordingViewer::new();
        viewer.create_window(&WindowOptions::default()).unwrap();
        viewer.add_geometry(&PointCloud::empty()).unwrap();

        let mut render_loop = RenderLoop::new(
            Arc::clone(&store),
            shutdown.clone(),
            RenderLoopConfig {
                tick_interval: Duration::from_millis(1),
                max_frames: Some(20),
            },
        );
        let stats = render_loop.run(&mut viewer).await.unwrap();
        sensor.stop();
        viewer.destroy_window().unwrap();

        assert_eq!(stats.frames_rendered, 20);
        assert_eq!(stats.termination, Some(TerminationReason::FrameLimit));
        assert!(stats.geometry_updates >= 1);
        assert_eq!(stats.last_points, expected_points);

        let updates = viewer.count(|c| matches!(c, ViewerCall::UpdateGeometry { .. }));
        assert_eq!(updates as u64, stats.geometry_updates);
        assert_eq!(
            viewer.count(|c| *c == ViewerCall::UpdateGeometry {
                points: expected_points
            }),
            updates
        );
        assert_eq!(viewer.calls().last(), Some(&ViewerCall::DestroyWindow));

        // Nothing is delivered once stop returned
        let generation = store.generation();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.generation(), generation);
        assert!(!sensor.is_listening());
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::{
        ActorFactory, ActorFactoryError, MockCarlaClient, MockConfig, MockSensorConfig,
        TeardownReport,
    };
    use colorizer::ColorScheme;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::ShutdownSignal;
    use ingestion::AcquisitionCallback;
    use point_store::PointCloudStore;

    const SESSION_TOML: &str = r#"
[world]
map = "Town02"
timeout_sec = 2.0

[vehicle]
id = "ego"
autopilot = true

[lidar]
id = "roof_lidar"
modality = "semantic"
frequency_hz = 20.0
[lidar.transform.location]
x = 0.0
y = 0.0
z = 2.5
"#;

    fn mock_client(config: MockConfig) -> MockCarlaClient {
        MockCarlaClient::with_config(MockConfig {
            sensor: Some(MockSensorConfig {
                frequency_hz: 200.0,
                points_per_scan: 256,
                ..Default::default()
            }),
            ..config
        })
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..400 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_config_driven_session_with_teardown() {
        let blueprint = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        let client = mock_client(MockConfig::default());
        let mut factory = ActorFactory::new(client.clone());

        factory.connect(&blueprint.world).await.unwrap();
        factory.configure_world(&blueprint.world).await.unwrap();
        let vehicle = factory.spawn_vehicle(&blueprint.vehicle).await.unwrap();
        let lidar = factory.spawn_lidar(&blueprint.lidar, vehicle).await.unwrap();

        assert_eq!(client.parent_of(lidar), Some(vehicle));
        assert!(client.autopilot_enabled(vehicle));
        assert_eq!(
            client.world_config().and_then(|w| w.map),
            Some("Town02".to_string())
        );

        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let sensor = factory.sensor_source(lidar, &blueprint.lidar).unwrap();
        sensor.listen(
            AcquisitionCallback::new(
                blueprint.lidar.id.as_str().into(),
                blueprint.lidar.modality,
                Arc::new(ColorScheme::from_config(&blueprint.colorization).unwrap()),
                Arc::clone(&store),
                shutdown.clone(),
            )
            .into_callback(),
        );

        assert!(wait_until(|| store.has_data()).await);
        sensor.stop();

        let report = factory.teardown().await;
        assert_eq!(
            report,
            TeardownReport {
                destroyed: 2,
                failed: vec![],
            }
        );
        assert_eq!(client.destroy_log(), vec![lidar, vehicle]);
        assert_eq!(client.actor_count(), 0);
        assert!(!shutdown.is_requested());
    }

    #[tokio::test]
    async fn test_teardown_survives_destroy_failure() {
        let blueprint = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        let client = mock_client(MockConfig {
            fail_destroy: vec![1001],
            ..Default::default()
        });
        let mut factory = ActorFactory::new(client.clone());

        factory.connect(&blueprint.world).await.unwrap();
        let vehicle = factory.spawn_vehicle(&blueprint.vehicle).await.unwrap();
        let lidar = factory.spawn_lidar(&blueprint.lidar, vehicle).await.unwrap();
        assert_eq!(lidar, 1001);

        let report = factory.teardown().await;
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.failed, vec![lidar]);
        assert_eq!(client.destroy_log(), vec![lidar, vehicle]);

        // Drained: a second pass destroys nothing
        assert_eq!(factory.teardown().await, TeardownReport::default());
        assert_eq!(client.destroy_count(vehicle), 1);
    }

    #[tokio::test]
    async fn test_sensor_spawn_failure_then_teardown() {
        let blueprint = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        let client = mock_client(MockConfig {
            fail_sensors: vec!["sensor.lidar.ray_cast_semantic".into()],
            ..Default::default()
        });
        let mut factory = ActorFactory::new(client.clone());

        factory.connect(&blueprint.world).await.unwrap();
        let vehicle = factory.spawn_vehicle(&blueprint.vehicle).await.unwrap();
        let err = factory
            .spawn_lidar(&blueprint.lidar, vehicle)
            .await
            .unwrap_err();
        assert!(matches!(err, ActorFactoryError::SensorSpawnFailed { .. }));
        assert_eq!(factory.spawned().len(), 1);

        let report = factory.teardown().await;
        assert_eq!(report.destroyed, 1);
        assert_eq!(client.destroy_log(), vec![vehicle]);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let mut blueprint = ConfigLoader::load_from_str(SESSION_TOML, ConfigFormat::Toml).unwrap();
        blueprint.world.timeout_sec = 0.05;
        let client = mock_client(MockConfig {
            connect_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        let mut factory = ActorFactory::new(client.clone());

        let err = factory.connect(&blueprint.world).await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(matches!(
            err,
            ActorFactoryError::ConnectionTimeout { timeout_ms: 50, .. }
        ));
        assert!(!client.is_connected());
    }
}
