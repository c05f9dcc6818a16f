//! Sample encodings understood by the stream driver.

use std::{fmt::Display, str::FromStr};

use dasp_sample::{FromSample, ToSample};

/// A single fixed-width sample of signal data.
///
/// Samples are converted to normalized `f32` for filtering and back again on the way out,
/// using the `dasp_sample` conversions. Integer full scale maps to `[-1.0, 1.0)`, and
/// out-of-range floats saturate.
pub trait Sample:
    hound::Sample
    + FromSample<f32>
    + ToSample<f32>
    + Copy
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
{
    /// The [`Datatype`] tag for this encoding.
    const DATATYPE: Datatype;

    /// Size of one sample in bytes, as stored in a raw stream.
    const BYTES: usize;

    /// Decodes one sample from exactly [`Self::BYTES`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of the sample to `out`.
    fn extend_le(self, out: &mut Vec<u8>);
}

impl Sample for i16 {
    const DATATYPE: Datatype = Datatype::Int16;
    const BYTES: usize = 2;

    #[inline]
    fn from_le_slice(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Sample for i32 {
    const DATATYPE: Datatype = Datatype::Int32;
    const BYTES: usize = 4;

    #[inline]
    fn from_le_slice(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Sample for f32 {
    const DATATYPE: Datatype = Datatype::Float32;
    const BYTES: usize = 4;

    #[inline]
    fn from_le_slice(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Runtime tag for a [`Sample`] encoding, used wherever the encoding is chosen by configuration.
///
/// Both sides of a conversion use the same encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Datatype {
    /// 16-bit signed integer.
    #[default]
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 32-bit float.
    Float32,
}

impl Datatype {
    /// Size of one sample in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            Datatype::Int16 => i16::BYTES,
            Datatype::Int32 => i32::BYTES,
            Datatype::Float32 => f32::BYTES,
        }
    }

    /// The WAV specification for a mono stream of this encoding at the given rate.
    pub fn wav_spec(self, sample_rate: u32) -> hound::WavSpec {
        let (bits_per_sample, sample_format) = match self {
            Datatype::Int16 => (16, hound::SampleFormat::Int),
            Datatype::Int32 => (32, hound::SampleFormat::Int),
            Datatype::Float32 => (32, hound::SampleFormat::Float),
        };
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

impl Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Datatype::Int16 => "i16",
            Datatype::Int32 => "i32",
            Datatype::Float32 => "f32",
        };
        f.write_str(name)
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i16" | "int16" => Ok(Datatype::Int16),
            "i32" | "int32" => Ok(Datatype::Int32),
            "f32" | "float32" => Ok(Datatype::Float32),
            other => Err(format!("unknown sample datatype `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_normalization() {
        let min: f32 = i16::MIN.to_sample_();
        let zero: f32 = 0i16.to_sample_();
        assert_eq!(min, -1.0);
        assert_eq!(zero, 0.0);
        assert_eq!(i16::from_sample_(2.0f32), i16::MAX);
        assert_eq!(i16::from_sample_(-2.0f32), i16::MIN);
        for value in [-12_345i16, -1, 0, 1, 4_096, 30_000] {
            let normalized: f32 = value.to_sample_();
            assert_eq!(i16::from_sample_(normalized), value);
        }
    }

    #[test]
    fn test_i32_saturates() {
        assert_eq!(i32::from_sample_(1.5f32), i32::MAX);
        assert_eq!(i32::from_sample_(-1.5f32), i32::MIN);
        assert_eq!(i32::from_sample_(0.0f32), 0);
    }

    #[test]
    fn test_le_bytes() {
        let mut out = Vec::new();
        (-2i16).extend_le(&mut out);
        0.5f32.extend_le(&mut out);
        assert_eq!(out.len(), i16::BYTES + f32::BYTES);
        assert_eq!(i16::from_le_slice(&out[..2]), -2);
        assert_eq!(f32::from_le_slice(&out[2..]), 0.5);
    }

    #[test]
    fn test_datatype_parse() {
        assert_eq!("i16".parse::<Datatype>().unwrap(), Datatype::Int16);
        assert_eq!("float32".parse::<Datatype>().unwrap(), Datatype::Float32);
        assert!("u8".parse::<Datatype>().is_err());
        assert_eq!(Datatype::Int32.to_string(), "i32");
        assert_eq!(Datatype::Int32.bytes(), 4);
        assert_eq!(i16::DATATYPE, Datatype::Int16);
    }
}
