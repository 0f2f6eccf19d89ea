//! Lossless serialization of pixel buffers for persistence.

use crate::buffer::{BufferError, PixelBuffer};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Encoding/decoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("PNG decoding failed: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("Unsupported PNG layout: {0:?} at {1:?}")]
    UnsupportedLayout(png::ColorType, png::BitDepth),
    #[error("Decoded image is {actual_width}x{actual_height}, record says {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// An encoded raster: 8-bit RGBA PNG.
///
/// `decode(encode(b))` reproduces `b` byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedImage {
    pub width: u32,
    pub height: u32,
    /// PNG bytes; base64 in JSON.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl SerializedImage {
    pub fn encode(buffer: &PixelBuffer) -> Result<Self, CodecError> {
        let mut data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut data, buffer.width(), buffer.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(buffer.as_bytes())?;
            writer.finish()?;
        }
        Ok(Self {
            width: buffer.width(),
            height: buffer.height(),
            data,
        })
    }

    pub fn decode(&self) -> Result<PixelBuffer, CodecError> {
        let decoder = png::Decoder::new(Cursor::new(&self.data));
        let mut reader = decoder.read_info()?;
        let mut pixels = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels)?;

        if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
            return Err(CodecError::UnsupportedLayout(info.color_type, info.bit_depth));
        }
        if info.width != self.width || info.height != self.height {
            return Err(CodecError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: info.width,
                actual_height: info.height,
            });
        }
        pixels.truncate(info.buffer_size());
        Ok(PixelBuffer::from_rgba(info.width, info.height, pixels)?)
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The saved progress for one image. At most one per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub key: String,
    pub image: SerializedImage,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl SaveRecord {
    /// Build a record stamped with the current time.
    pub fn new(key: impl Into<String>, image: SerializedImage) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            key: key.into(),
            image,
            timestamp_ms,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(5, 3).unwrap();
        buf.set(0, 0, Rgba::new(255, 0, 0, 255)).unwrap();
        buf.set(4, 2, Rgba::new(1, 2, 3, 4)).unwrap();
        // Semi-transparent pixels must survive untouched.
        buf.set(2, 1, Rgba::new(200, 100, 50, 77)).unwrap();
        buf
    }

    #[test]
    fn test_encode_decode_is_lossless() {
        let buf = sample();
        let encoded = SerializedImage::encode(&buf).unwrap();
        assert!(encoded.data.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(encoded.decode().unwrap(), buf);
    }

    #[test]
    fn test_dimension_mismatch_detected() {
        let mut encoded = SerializedImage::encode(&sample()).unwrap();
        encoded.width = 6;
        assert!(matches!(
            encoded.decode(),
            Err(CodecError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let bogus = SerializedImage {
            width: 1,
            height: 1,
            data: vec![1, 2, 3],
        };
        assert!(matches!(bogus.decode(), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_record_json() {
        let record = SaveRecord::new("images/cat.png", SerializedImage::encode(&sample()).unwrap());
        let json = record.to_json().unwrap();
        assert!(json.contains("\"key\":\"images/cat.png\""));
        let parsed = SaveRecord::from_json(&json).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.image.decode().unwrap(), sample());
    }
}
