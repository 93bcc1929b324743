//! Scene light encoding and scoped light buffers

use crate::compute::{DeviceBuffer, LightFeatures, MemoryTracker};
use crate::foundation::math::{utils, Vec3};
use crate::lighting::records::{
    decode_records, encode_records, AreaLightRecord, DirectionalLightRecord, LightRecord,
    PointLightRecord, SpotLightRecord,
};
use crate::lighting::LightEncodeError;
use crate::scene::{LightKind, SceneLight};

/// Lights bucketed by type, in scene order within each bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedLights {
    /// Directional lights
    pub directional: Vec<DirectionalLightRecord>,
    /// Point lights
    pub point: Vec<PointLightRecord>,
    /// Spot lights
    pub spot: Vec<SpotLightRecord>,
    /// Area lights
    pub area: Vec<AreaLightRecord>,
}

impl EncodedLights {
    /// Capability flags for the non-empty buckets
    pub fn features(&self) -> LightFeatures {
        let mut features = LightFeatures::empty();
        features.set(LightFeatures::DIRECTIONAL_LIGHTS, !self.directional.is_empty());
        features.set(LightFeatures::POINT_LIGHTS, !self.point.is_empty());
        features.set(LightFeatures::SPOT_LIGHTS, !self.spot.is_empty());
        features.set(LightFeatures::AREA_LIGHTS, !self.area.is_empty());
        features
    }

    /// Total number of lights
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len() + self.spot.len() + self.area.len()
    }

    /// Whether no light was encoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts scene lights into fixed-layout records
///
/// Colors are multiplied by intensity and converted from display space to
/// linear space with a 2.2 power curve.
pub struct LightEncoder;

impl LightEncoder {
    /// Encode every enabled light
    pub fn encode<'a>(lights: impl IntoIterator<Item = &'a SceneLight>) -> Result<EncodedLights, LightEncodeError> {
        let mut encoded = EncodedLights::default();

        for (index, light) in lights.into_iter().enumerate() {
            if !light.enabled {
                continue;
            }
            let color = linear_color(light, index)?;

            match light.kind {
                LightKind::Directional { direction } => {
                    encoded.directional.push(DirectionalLightRecord {
                        direction: unit(&direction, index, "direction")?.into(),
                        color: color.into(),
                    });
                }
                LightKind::Point { position, range } => {
                    encoded.point.push(PointLightRecord {
                        position: position.into(),
                        color: color.into(),
                        range: positive_range(range, index)?,
                    });
                }
                LightKind::Spot {
                    position,
                    direction,
                    range,
                    angle,
                } => {
                    if !(angle > 0.0 && angle < 180.0) {
                        return Err(LightEncodeError::InvalidLight {
                            index,
                            reason: format!("spot angle {angle} outside (0, 180)"),
                        });
                    }
                    encoded.spot.push(SpotLightRecord {
                        position: position.into(),
                        direction: unit(&direction, index, "direction")?.into(),
                        color: color.into(),
                        range: positive_range(range, index)?,
                        angle,
                    });
                }
                LightKind::Area {
                    position,
                    forward,
                    up,
                    size,
                    range,
                } => {
                    let forward = unit(&forward, index, "forward")?;
                    let right = unit(&up.cross(&forward), index, "up")?;
                    let up = forward.cross(&right);
                    if size.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                        return Err(LightEncodeError::InvalidLight {
                            index,
                            reason: format!("area size {size:?} must be positive"),
                        });
                    }
                    encoded.area.push(AreaLightRecord {
                        position: position.into(),
                        forward: forward.into(),
                        right: right.into(),
                        up: up.into(),
                        size: size.into(),
                        color: color.into(),
                        range: positive_range(range, index)?,
                    });
                }
            }
        }

        log::debug!(
            "Encoded lights: {} directional, {} point, {} spot, {} area",
            encoded.directional.len(),
            encoded.point.len(),
            encoded.spot.len(),
            encoded.area.len()
        );
        Ok(encoded)
    }
}

fn linear_color(light: &SceneLight, index: usize) -> Result<Vec3, LightEncodeError> {
    if !light.intensity.is_finite() || light.color.iter().any(|c| !c.is_finite()) {
        return Err(LightEncodeError::InvalidLight {
            index,
            reason: "color and intensity must be finite".to_string(),
        });
    }
    Ok(utils::gamma_to_linear(&(light.color * light.intensity)))
}

fn unit(v: &Vec3, index: usize, field: &str) -> Result<Vec3, LightEncodeError> {
    v.try_normalize(f32::EPSILON)
        .ok_or_else(|| LightEncodeError::InvalidLight {
            index,
            reason: format!("{field} has zero length"),
        })
}

fn positive_range(range: f32, index: usize) -> Result<f32, LightEncodeError> {
    if range.is_finite() && range > 0.0 {
        Ok(range)
    } else {
        Err(LightEncodeError::InvalidLight {
            index,
            reason: format!("range {range} must be positive"),
        })
    }
}

/// Light buffers uploaded for the duration of one solver call
///
/// Types without lights get no buffer; the matching [`LightFeatures`] flag is
/// cleared instead. Dropping the batch releases every buffer.
#[derive(Debug)]
pub struct LightBatch {
    features: LightFeatures,
    directional: Option<DeviceBuffer>,
    point: Option<DeviceBuffer>,
    spot: Option<DeviceBuffer>,
    area: Option<DeviceBuffer>,
}

impl LightBatch {
    /// Upload encoded lights
    pub fn upload(lights: &EncodedLights, memory: &MemoryTracker) -> Self {
        Self {
            features: lights.features(),
            directional: upload_bucket(memory, &lights.directional),
            point: upload_bucket(memory, &lights.point),
            spot: upload_bucket(memory, &lights.spot),
            area: upload_bucket(memory, &lights.area),
        }
    }

    /// Which light types are present
    pub fn features(&self) -> LightFeatures {
        self.features
    }

    /// Bytes held by the batch
    pub fn byte_size(&self) -> usize {
        [&self.directional, &self.point, &self.spot, &self.area]
            .iter()
            .filter_map(|b| b.as_ref().map(DeviceBuffer::len))
            .sum()
    }

    /// Raw buffer of a light type, `None` when its flag is cleared
    pub fn buffer(&self, feature: LightFeatures) -> Option<&DeviceBuffer> {
        if feature == LightFeatures::DIRECTIONAL_LIGHTS {
            self.directional.as_ref()
        } else if feature == LightFeatures::POINT_LIGHTS {
            self.point.as_ref()
        } else if feature == LightFeatures::SPOT_LIGHTS {
            self.spot.as_ref()
        } else if feature == LightFeatures::AREA_LIGHTS {
            self.area.as_ref()
        } else {
            None
        }
    }

    /// Read every present buffer back into records
    pub fn decode(&self) -> Result<EncodedLights, LightEncodeError> {
        Ok(EncodedLights {
            directional: decode_bucket(self.directional.as_ref())?,
            point: decode_bucket(self.point.as_ref())?,
            spot: decode_bucket(self.spot.as_ref())?,
            area: decode_bucket(self.area.as_ref())?,
        })
    }
}

fn upload_bucket<T: LightRecord>(memory: &MemoryTracker, records: &[T]) -> Option<DeviceBuffer> {
    (!records.is_empty()).then(|| memory.upload(format!("{}_lights", T::TYPE_NAME), encode_records(records)))
}

fn decode_bucket<T: LightRecord>(buffer: Option<&DeviceBuffer>) -> Result<Vec<T>, LightEncodeError> {
    buffer.map_or_else(|| Ok(Vec::new()), |b| decode_records(b.bytes()))
}
