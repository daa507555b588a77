//! Acquisition callback
//!
//! Invoked on the sensor's delivery thread. Never blocks on rendering: the
//! only shared state it touches is the store's swap lock.

use std::sync::Arc;
use std::time::Instant;

use colorizer::{ColorScheme, Colorize};
use contracts::{
    ColorTriple, IntensityPoint, LidarRecord, SemanticPoint, SensorDataCallback, SensorId,
    SensorModality, SensorPacket, ShutdownSignal,
};
use point_store::PointCloudStore;
use tracing::{error, trace, warn};

use crate::decoder::decode;
use crate::normalizer::normalize_positions;
use crate::{IngestionError, IngestionMetrics, Result};

/// Outcome of a successful tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Store generation produced by the write
    pub generation: u64,
    /// Points in the published cloud
    pub points: usize,
}

/// Decode, normalize, colorize and publish one sensor's buffers
pub struct AcquisitionCallback {
    sensor_id: SensorId,
    modality: SensorModality,
    scheme: Arc<ColorScheme>,
    store: Arc<PointCloudStore>,
    shutdown: ShutdownSignal,
    metrics: Arc<IngestionMetrics>,
}

impl AcquisitionCallback {
    pub fn new(
        sensor_id: SensorId,
        modality: SensorModality,
        scheme: Arc<ColorScheme>,
        store: Arc<PointCloudStore>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            sensor_id,
            modality,
            scheme,
            store,
            shutdown,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    pub fn sensor_id(&self) -> &SensorId {
        &self.sensor_id
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the pipeline for one packet and publish the result
    ///
    /// On error the store keeps its previous cloud.
    pub fn process(&self, packet: &SensorPacket) -> Result<Published> {
        if packet.modality != self.modality {
            return Err(IngestionError::ModalityMismatch {
                sensor_id: self.sensor_id.to_string(),
                expected: self.modality,
                actual: packet.modality,
            });
        }

        let (positions, colors) = match self.modality {
            SensorModality::Intensity => {
                build_cloud::<IntensityPoint, _>(&packet.payload, &self.scheme.intensity)?
            }
            SensorModality::Semantic => {
                build_cloud::<SemanticPoint, _>(&packet.payload, &self.scheme.semantic)?
            }
        };

        let points = positions.len();
        let generation = self.store.write(positions, colors)?;
        Ok(Published { generation, points })
    }

    /// Sensor-thread entry point
    ///
    /// Per-tick failures are logged and skipped. A store rejection trips the
    /// session shutdown signal.
    pub fn on_packet(&self, packet: SensorPacket) {
        let started = Instant::now();
        self.metrics.record_received();
        observability::record_buffer_received(
            &self.sensor_id,
            packet.modality.as_str(),
            packet.payload.len(),
        );

        let result = self.process(&packet);
        self.settle(result, packet.frame_id, started);
    }

    fn settle(&self, result: Result<Published>, frame_id: Option<u64>, started: Instant) {
        match result {
            Ok(published) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.metrics.record_published(published.points);
                observability::record_cloud_published(
                    &self.sensor_id,
                    published.points,
                    elapsed_ms,
                );
                trace!(
                    sensor_id = %self.sensor_id,
                    frame_id = ?frame_id,
                    generation = published.generation,
                    points = published.points,
                    elapsed_ms,
                    "Tick published"
                );
            }
            Err(e) if e.is_tick_local() => {
                self.metrics.record_skipped();
                observability::record_tick_skipped(&self.sensor_id, e.reason());
                warn!(
                    sensor_id = %self.sensor_id,
                    frame_id = ?frame_id,
                    error = %e,
                    "Skipping tick, previous cloud stays visible"
                );
            }
            Err(e) => {
                error!(
                    sensor_id = %self.sensor_id,
                    frame_id = ?frame_id,
                    error = %e,
                    "Point cloud invariant violated, requesting shutdown"
                );
                self.shutdown.fail(format!("sensor {}: {e}", self.sensor_id));
            }
        }
    }

    /// Wrap into the closure type sensor sources accept
    pub fn into_callback(self) -> SensorDataCallback {
        let this = Arc::new(self);
        Arc::new(move |packet| this.on_packet(packet))
    }
}

fn build_cloud<P, C>(payload: &[u8], colorizer: &C) -> Result<(Vec<[f32; 3]>, Vec<ColorTriple>)>
where
    P: LidarRecord,
    C: Colorize<P>,
{
    let points = decode::<P>(payload)?;
    let positions = normalize_positions(&points);
    let colors = colorizer.colorize_all(&points)?;
    Ok((positions, colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use colorizer::{AttenuationModel, IntensityColorizer, Palette};
    use contracts::InvalidIntensityPolicy;
    use point_store::StoreError;

    fn packet(modality: SensorModality, payload: Vec<u8>) -> SensorPacket {
        SensorPacket {
            sensor_id: "lidar".into(),
            modality,
            timestamp: 0.0,
            frame_id: Some(1),
            payload: Bytes::from(payload),
        }
    }

    fn callback(modality: SensorModality, scheme: ColorScheme) -> AcquisitionCallback {
        AcquisitionCallback::new(
            "lidar".into(),
            modality,
            Arc::new(scheme),
            Arc::new(PointCloudStore::new()),
            ShutdownSignal::new(),
        )
    }

    fn intensity_bytes(points: &[IntensityPoint]) -> Vec<u8> {
        bytemuck::cast_slice(points).to_vec()
    }

    #[test]
    fn test_identical_intensities_give_identical_colors() {
        let cb = callback(SensorModality::Intensity, ColorScheme::default());
        let points: Vec<_> = (0..4)
            .map(|i| IntensityPoint {
                x: i as f32,
                y: 1.0,
                z: 0.0,
                intensity: 50.0,
            })
            .collect();

        let published = cb
            .process(&packet(SensorModality::Intensity, intensity_bytes(&points)))
            .unwrap();
        assert_eq!(published, Published { generation: 1, points: 4 });

        let cloud = cb.store.read();
        let last = *Palette::plasma().colors().last().unwrap();
        assert_eq!(cloud.positions().len(), 4);
        assert_eq!(cloud.colors(), &[last; 4]);
        assert_eq!(cloud.positions()[2], [2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_semantic_road_tick() {
        let cb = callback(SensorModality::Semantic, ColorScheme::default());
        let points = vec![
            SemanticPoint {
                object_tag: 7,
                ..Default::default()
            };
            6
        ];
        cb.process(&packet(
            SensorModality::Semantic,
            bytemuck::cast_slice(&points).to_vec(),
        ))
        .unwrap();

        let road = ColorTriple::new(128.0 / 255.0, 64.0 / 255.0, 128.0 / 255.0);
        assert!(cb.store.read().colors().iter().all(|c| *c == road));
    }

    #[test]
    fn test_positions_and_colors_stay_aligned() {
        let cb = callback(SensorModality::Semantic, ColorScheme::default());
        let points: Vec<_> = (0..34u32)
            .map(|tag| SemanticPoint {
                x: tag as f32,
                y: tag as f32,
                z: 0.0,
                cos_angle: 1.0,
                object_index: tag,
                object_tag: tag,
            })
            .collect();
        cb.process(&packet(
            SensorModality::Semantic,
            bytemuck::cast_slice(&points).to_vec(),
        ))
        .unwrap();

        let table = cb.scheme.semantic.table().clone();
        let cloud = cb.store.read();
        for (i, (pos, color)) in cloud.iter().enumerate() {
            assert_eq!(pos[0], i as f32);
            assert_eq!(pos[1], -(i as f32));
            assert_eq!(*color, table.lookup(i as u32).unwrap());
        }
    }

    #[test]
    fn test_malformed_tick_keeps_previous_cloud() {
        let cb = callback(SensorModality::Intensity, ColorScheme::default());
        let good = vec![IntensityPoint::default(); 3];
        cb.on_packet(packet(SensorModality::Intensity, intensity_bytes(&good)));

        let mut bad = intensity_bytes(&good);
        bad.pop();
        cb.on_packet(packet(SensorModality::Intensity, bad));

        assert_eq!(cb.store.read().len(), 3);
        assert_eq!(cb.store.generation(), 1);
        let snapshot = cb.metrics.snapshot();
        assert_eq!(snapshot.buffers_received, 2);
        assert_eq!(snapshot.clouds_published, 1);
        assert_eq!(snapshot.ticks_skipped, 1);
        assert!(!cb.shutdown.is_requested());
    }

    #[test]
    fn test_rejected_intensity_skips_tick() {
        let scheme = ColorScheme {
            intensity: IntensityColorizer::new(
                Palette::plasma(),
                AttenuationModel::default(),
                InvalidIntensityPolicy::Reject,
            ),
            ..ColorScheme::default()
        };
        let cb = callback(SensorModality::Intensity, scheme);
        let points = [IntensityPoint {
            intensity: 0.0,
            ..Default::default()
        }];

        let err = cb
            .process(&packet(SensorModality::Intensity, intensity_bytes(&points)))
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_intensity");
        assert!(!cb.store.has_data());
    }

    #[test]
    fn test_unknown_tag_and_modality_mismatch_are_tick_local() {
        let cb = callback(SensorModality::Semantic, ColorScheme::default());
        let points = [SemanticPoint {
            object_tag: 40,
            ..Default::default()
        }];
        let err = cb
            .process(&packet(
                SensorModality::Semantic,
                bytemuck::cast_slice(&points).to_vec(),
            ))
            .unwrap_err();
        assert!(err.is_tick_local());
        assert_eq!(err.reason(), "unknown_class_tag");

        let err = cb
            .process(&packet(SensorModality::Intensity, vec![0u8; 16]))
            .unwrap_err();
        assert!(matches!(err, IngestionError::ModalityMismatch { .. }));
    }

    #[test]
    fn test_store_rejection_trips_shutdown() {
        let cb = callback(SensorModality::Intensity, ColorScheme::default());
        let err = IngestionError::from(StoreError::LengthMismatch {
            positions: 3,
            colors: 2,
        });
        assert!(!err.is_tick_local());

        cb.settle(Err(err), Some(9), Instant::now());
        assert!(cb.shutdown.is_requested());
        assert!(cb.shutdown.failure().unwrap().contains("length mismatch"));
    }

    #[test]
    fn test_into_callback() {
        let store = Arc::new(PointCloudStore::new());
        let cb = AcquisitionCallback::new(
            "lidar".into(),
            SensorModality::Intensity,
            Arc::new(ColorScheme::default()),
            Arc::clone(&store),
            ShutdownSignal::new(),
        );
        let metrics = cb.metrics();
        let callback = cb.into_callback();

        callback(packet(
            SensorModality::Intensity,
            intensity_bytes(&[IntensityPoint::default(); 2]),
        ));
        callback(packet(SensorModality::Intensity, vec![]));

        assert_eq!(store.generation(), 2);
        assert!(store.read().is_empty());
        assert_eq!(metrics.snapshot().clouds_published, 2);
    }
}
