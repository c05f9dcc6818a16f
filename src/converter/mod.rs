//! The sample-rate converter contract and its configuration.

use std::fmt::Display;

use thiserror::Error;

use crate::sample::Sample;

mod rubato;
pub use self::rubato::RubatoConverter;

/// Error type for [`Converter`] construction and processing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// A sample rate was zero, negative, or not finite.
    #[error("Invalid sample rate: {0}")]
    InvalidRate(f64),

    /// Only single-channel streams are supported.
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    /// The quality tier number does not name a known recipe.
    #[error("Unknown quality tier: {0}")]
    UnknownQuality(u32),

    /// The resampling kernel could not be built.
    #[error("Resampler construction failed: {0}")]
    Construction(#[from] ::rubato::ResamplerConstructionError),

    /// The resampling kernel failed while processing.
    #[error("Resampling failed: {0}")]
    Resample(#[from] ::rubato::ResampleError),

    /// Data was presented after end-of-input had been signalled.
    #[error("Input supplied after end of input")]
    InputAfterEnd,
}

impl ConvertError {
    /// A stable, non-zero code for this error, suitable as a process exit status.
    pub fn code(&self) -> i32 {
        match self {
            ConvertError::InvalidRate(_) => 2,
            ConvertError::UnsupportedChannels(_) => 3,
            ConvertError::UnknownQuality(_) => 4,
            ConvertError::Construction(_) => 5,
            ConvertError::Resample(_) => 6,
            ConvertError::InputAfterEnd => 7,
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// One unit of input presented to a [`Converter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input<'a, S> {
    /// A block of samples. May be empty, which asks the converter to keep draining.
    Data(&'a [S]),
    /// Input is permanently exhausted; the converter should flush what it holds.
    EndOfInput,
}

impl<S> Input<'_, S> {
    /// Returns `true` if this is the end-of-input marker.
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, Input::EndOfInput)
    }

    /// Number of samples carried by this input.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Input::Data(block) => block.len(),
            Input::EndOfInput => 0,
        }
    }

    /// Returns `true` if this input carries no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A streaming sample-rate converter.
///
/// Every sample of a [`Input::Data`] block is taken by the call; implementations buffer what
/// they cannot convert yet. Output may lag input arbitrarily, so a call may produce nothing.
/// After [`Input::EndOfInput`] the converter keeps releasing buffered output on every call
/// until it has none left, at which point it returns `Ok(0)`. Sending the marker more than
/// once is harmless.
///
/// Resources are released when the converter is dropped.
pub trait Converter<S: Sample> {
    /// Consumes `input` and writes up to `output.len()` converted samples into `output`,
    /// returning how many were written.
    fn process(&mut self, input: Input<'_, S>, output: &mut [S]) -> ConvertResult<usize>;
}

impl<S: Sample, C: Converter<S> + ?Sized> Converter<S> for Box<C> {
    #[inline]
    fn process(&mut self, input: Input<'_, S>, output: &mut [S]) -> ConvertResult<usize> {
        (**self).process(input, output)
    }
}

/// Algorithmic quality tier of a converter.
///
/// The numbering follows the classic resampler presets, so a tier can be picked by number
/// from the command line with [`QualityRecipe::from_number`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QualityRecipe {
    /// Cubic polynomial interpolation.
    Quick,
    /// 16-bit with a wide rolloff.
    Low,
    /// 16-bit with a medium rolloff.
    Medium,
    /// 16-bit precision.
    Bits16,
    /// 20-bit precision. Also known as high quality.
    #[default]
    Bits20,
    /// 24-bit precision.
    Bits24,
    /// 28-bit precision. Also known as very high quality.
    Bits28,
    /// 32-bit precision.
    Bits32,
    /// The best of the classic sinc presets.
    BestSinc,
    /// The medium classic sinc preset.
    MediumSinc,
    /// The fast classic sinc preset.
    FastSinc,
}

impl QualityRecipe {
    /// Alias for [`QualityRecipe::Bits20`].
    pub const HIGH: Self = QualityRecipe::Bits20;
    /// Alias for [`QualityRecipe::Bits28`].
    pub const VERY_HIGH: Self = QualityRecipe::Bits28;

    /// Looks up a recipe by its preset number.
    pub fn from_number(number: u32) -> ConvertResult<Self> {
        let recipe = match number {
            0 => QualityRecipe::Quick,
            1 => QualityRecipe::Low,
            2 => QualityRecipe::Medium,
            3 => QualityRecipe::Bits16,
            4 => QualityRecipe::Bits20,
            5 => QualityRecipe::Bits24,
            6 => QualityRecipe::Bits28,
            7 => QualityRecipe::Bits32,
            8 => QualityRecipe::BestSinc,
            9 => QualityRecipe::MediumSinc,
            10 => QualityRecipe::FastSinc,
            other => return Err(ConvertError::UnknownQuality(other)),
        };
        Ok(recipe)
    }

    /// The preset number of this recipe.
    pub fn number(self) -> u32 {
        match self {
            QualityRecipe::Quick => 0,
            QualityRecipe::Low => 1,
            QualityRecipe::Medium => 2,
            QualityRecipe::Bits16 => 3,
            QualityRecipe::Bits20 => 4,
            QualityRecipe::Bits24 => 5,
            QualityRecipe::Bits28 => 6,
            QualityRecipe::Bits32 => 7,
            QualityRecipe::BestSinc => 8,
            QualityRecipe::MediumSinc => 9,
            QualityRecipe::FastSinc => 10,
        }
    }
}

impl Display for QualityRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, self.number())
    }
}

/// Quality configuration of a converter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualitySpec {
    /// The quality tier.
    pub recipe: QualityRecipe,
}

impl QualitySpec {
    /// Creates a quality spec for the given tier.
    pub fn new(recipe: QualityRecipe) -> Self {
        Self { recipe }
    }
}

/// Execution configuration of a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeSpec {
    /// Number of worker threads the converter may use. `0` and `1` both mean single-threaded.
    pub num_threads: u32,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self { num_threads: 1 }
    }
}

impl RuntimeSpec {
    /// Creates a runtime spec with the given worker thread count.
    pub fn new(num_threads: u32) -> Self {
        Self { num_threads }
    }

    /// Returns `true` if the converter should run on the calling thread only.
    #[inline]
    pub fn is_single_threaded(&self) -> bool {
        self.num_threads <= 1
    }
}

/// Immutable construction parameters of a converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConverterSpec {
    /// Input sample rate in Hz.
    pub input_rate: f64,
    /// Output sample rate in Hz.
    pub output_rate: f64,
    /// Number of channels. Only `1` is supported.
    pub channels: usize,
    /// Quality tier.
    pub quality: QualitySpec,
    /// Execution configuration.
    pub runtime: RuntimeSpec,
}

impl ConverterSpec {
    /// Creates a mono spec with default quality and runtime configuration.
    pub fn new(input_rate: f64, output_rate: f64) -> Self {
        Self {
            input_rate,
            output_rate,
            channels: 1,
            quality: QualitySpec::default(),
            runtime: RuntimeSpec::default(),
        }
    }

    /// Sets the quality configuration.
    pub fn with_quality(mut self, quality: QualitySpec) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the runtime configuration.
    pub fn with_runtime(mut self, runtime: RuntimeSpec) -> Self {
        self.runtime = runtime;
        self
    }

    /// The output/input rate ratio.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.output_rate / self.input_rate
    }

    /// Checks the parameters that every converter relies on.
    pub fn validate(&self) -> ConvertResult<()> {
        for rate in [self.input_rate, self.output_rate] {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConvertError::InvalidRate(rate));
            }
        }
        if self.channels != 1 {
            return Err(ConvertError::UnsupportedChannels(self.channels));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_numbers() {
        for number in 0..=10 {
            let recipe = QualityRecipe::from_number(number).unwrap();
            assert_eq!(recipe.number(), number);
        }
        assert!(matches!(
            QualityRecipe::from_number(11),
            Err(ConvertError::UnknownQuality(11))
        ));
        assert_eq!(QualityRecipe::default(), QualityRecipe::HIGH);
        assert_eq!(QualityRecipe::VERY_HIGH.number(), 6);
    }

    #[test]
    fn test_spec_validation() {
        assert!(ConverterSpec::new(16_000.0, 8_000.0).validate().is_ok());
        assert!(matches!(
            ConverterSpec::new(0.0, 8_000.0).validate(),
            Err(ConvertError::InvalidRate(_))
        ));
        assert!(matches!(
            ConverterSpec::new(16_000.0, f64::NAN).validate(),
            Err(ConvertError::InvalidRate(_))
        ));
        let mut stereo = ConverterSpec::new(16_000.0, 8_000.0);
        stereo.channels = 2;
        assert!(matches!(
            stereo.validate(),
            Err(ConvertError::UnsupportedChannels(2))
        ));
    }

    #[test]
    fn test_error_codes_nonzero() {
        let errors = [
            ConvertError::InvalidRate(0.0),
            ConvertError::UnsupportedChannels(2),
            ConvertError::UnknownQuality(99),
            ConvertError::InputAfterEnd,
        ];
        for error in &errors {
            assert_ne!(error.code(), 0, "{error}");
        }
    }

    #[test]
    fn test_input_marker() {
        let block = [1i16, 2, 3];
        assert_eq!(Input::Data(&block[..]).len(), 3);
        assert!(!Input::Data(&block[..]).is_end());
        assert!(Input::<i16>::EndOfInput.is_end());
        assert!(Input::<i16>::EndOfInput.is_empty());
        assert!(Input::Data(&block[..0]).is_empty());
    }

    #[test]
    fn test_runtime_spec() {
        assert!(RuntimeSpec::new(0).is_single_threaded());
        assert!(RuntimeSpec::default().is_single_threaded());
        assert!(!RuntimeSpec::new(4).is_single_threaded());
    }
}
