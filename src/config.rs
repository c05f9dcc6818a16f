//! Run parameters of a conversion.

use crate::{
    converter::{ConverterSpec, QualitySpec, RuntimeSpec},
    sample::Datatype,
    sizing::{size_buffers, BufferSizes},
};

/// Default input sample rate in Hz.
pub const DEFAULT_INPUT_RATE: f64 = 16_000.0;
/// Default output sample rate in Hz.
pub const DEFAULT_OUTPUT_RATE: f64 = 8_000.0;
/// Default total sample budget shared by the input and output buffers.
pub const DEFAULT_BUFFER_BUDGET: usize = 1024;

/// Everything needed to set up one conversion run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Input sample rate in Hz.
    pub input_rate: f64,
    /// Output sample rate in Hz.
    pub output_rate: f64,
    /// Total number of samples shared by the input and output buffers.
    pub buffer_budget: usize,
    /// Sample encoding on both sides.
    pub datatype: Datatype,
    /// Converter quality.
    pub quality: QualitySpec,
    /// Converter execution.
    pub runtime: RuntimeSpec,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            input_rate: DEFAULT_INPUT_RATE,
            output_rate: DEFAULT_OUTPUT_RATE,
            buffer_budget: DEFAULT_BUFFER_BUDGET,
            datatype: Datatype::default(),
            quality: QualitySpec::default(),
            runtime: RuntimeSpec::default(),
        }
    }
}

impl StreamConfig {
    /// The converter parameters for this run.
    pub fn converter_spec(&self) -> ConverterSpec {
        ConverterSpec::new(self.input_rate, self.output_rate)
            .with_quality(self.quality)
            .with_runtime(self.runtime)
    }

    /// The buffer capacities for this run.
    pub fn buffer_sizes(&self) -> BufferSizes {
        size_buffers(self.input_rate, self.output_rate, self.buffer_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::QualityRecipe;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        let sizes = config.buffer_sizes();
        assert_eq!((sizes.input, sizes.output), (683, 341));

        let spec = config.converter_spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.quality.recipe, QualityRecipe::HIGH);
        assert_eq!(spec.ratio(), 0.5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_config_from_json() {
        let config: StreamConfig =
            serde_json::from_str(r#"{ "output_rate": 48000.0, "datatype": "float32" }"#).unwrap();
        assert_eq!(config.output_rate, 48_000.0);
        assert_eq!(config.input_rate, DEFAULT_INPUT_RATE);
        assert_eq!(config.datatype, Datatype::Float32);
    }
}
