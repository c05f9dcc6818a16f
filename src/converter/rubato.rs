//! [`Converter`] implementation backed by the `rubato` resampling kernels.

use std::{collections::VecDeque, marker::PhantomData};

use dasp_sample::{FromSample, ToSample};
use ::rubato::{
    FastFixedIn, PolynomialDegree, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use super::{ConvertError, ConvertResult, Converter, ConverterSpec, Input, QualityRecipe};
use crate::sample::Sample;

/// Number of input frames the kernel converts per call.
pub const CHUNK_FRAMES: usize = 1024;

/// Consecutive empty flush calls tolerated before the tail is considered drained.
const MAX_STALLED_FLUSHES: usize = 64;

enum Kernel {
    Sinc(SincFixedIn<f32>),
    Poly(FastFixedIn<f32>),
}

macro_rules! with_kernel {
    ($kernel:expr, $r:ident => $body:expr) => {
        match $kernel {
            Kernel::Sinc($r) => $body,
            Kernel::Poly($r) => $body,
        }
    };
}

impl Kernel {
    fn new(spec: &ConverterSpec) -> ConvertResult<Self> {
        let ratio = spec.ratio();
        let sinc = |sinc_len: usize,
                    f_cutoff: f32,
                    oversampling_factor: usize,
                    interpolation: SincInterpolationType,
                    window: WindowFunction|
         -> ConvertResult<Self> {
            let params = SincInterpolationParameters {
                sinc_len,
                f_cutoff,
                oversampling_factor,
                interpolation,
                window,
            };
            Ok(Kernel::Sinc(SincFixedIn::new(
                ratio,
                1.0,
                params,
                CHUNK_FRAMES,
                spec.channels,
            )?))
        };

        use SincInterpolationType as I;
        use WindowFunction as W;
        match spec.quality.recipe {
            QualityRecipe::Quick => Ok(Kernel::Poly(FastFixedIn::new(
                ratio,
                1.0,
                PolynomialDegree::Cubic,
                CHUNK_FRAMES,
                spec.channels,
            )?)),
            QualityRecipe::Low => sinc(32, 0.85, 256, I::Linear, W::Blackman),
            QualityRecipe::Medium => sinc(64, 0.9, 256, I::Linear, W::Blackman),
            QualityRecipe::Bits16 => sinc(96, 0.9, 256, I::Linear, W::BlackmanHarris),
            QualityRecipe::Bits20 => sinc(128, 0.95, 256, I::Cubic, W::BlackmanHarris),
            QualityRecipe::Bits24 => sinc(192, 0.95, 256, I::Cubic, W::BlackmanHarris2),
            QualityRecipe::Bits28 => sinc(256, 0.95, 256, I::Cubic, W::BlackmanHarris2),
            QualityRecipe::Bits32 => sinc(384, 0.95, 512, I::Cubic, W::BlackmanHarris2),
            QualityRecipe::BestSinc => sinc(256, 0.95, 512, I::Cubic, W::BlackmanHarris2),
            QualityRecipe::MediumSinc => sinc(128, 0.9, 256, I::Linear, W::Blackman2),
            QualityRecipe::FastSinc => sinc(64, 0.85, 256, I::Nearest, W::Hann2),
        }
    }

    /// Output frames to drop from the head of the stream so it lines up with the input.
    ///
    /// `SincFixedIn` already emits its first frame centred on the first input frame, so only
    /// the polynomial kernel lags behind by its reported delay.
    fn head_delay(&self) -> usize {
        match self {
            Kernel::Sinc(_) => 0,
            Kernel::Poly(r) => r.output_delay(),
        }
    }
}

/// A mono streaming converter built on `rubato`'s fixed-input kernels.
///
/// Input is queued until a full kernel chunk is available, and converted output is queued until
/// the caller has room for it. Any kernel lag is trimmed from the head of the stream,
/// and the flushed tail is trimmed so the whole stream holds `round(input * ratio)` samples.
pub struct RubatoConverter<S: Sample> {
    kernel: Kernel,
    ratio: f64,

    pending: Vec<f32>,
    scratch: Vec<Vec<f32>>,
    ready: VecDeque<f32>,

    delay_remaining: usize,
    total_in: u64,
    emitted: u64,
    ended: bool,

    _sample: PhantomData<S>,
}

impl<S: Sample> RubatoConverter<S> {
    /// Creates a converter for the given parameters.
    ///
    /// This allocates the kernel's filter tables, so it shouldn't be called per block.
    pub fn new(spec: ConverterSpec) -> ConvertResult<Self> {
        spec.validate()?;

        if !spec.runtime.is_single_threaded() {
            log::info!(
                "Requested {} worker threads; the rubato kernels filter on the calling thread",
                spec.runtime.num_threads
            );
        }

        let kernel = Kernel::new(&spec)?;
        let output_max = with_kernel!(&kernel, r => r.output_frames_max());
        let delay = kernel.head_delay();

        log::debug!(
            "Created converter {} Hz -> {} Hz, quality {}, {} ({} frame delay)",
            spec.input_rate,
            spec.output_rate,
            spec.quality.recipe,
            S::DATATYPE,
            delay
        );

        Ok(Self {
            kernel,
            ratio: spec.ratio(),
            pending: Vec::with_capacity(CHUNK_FRAMES * 2),
            scratch: vec![vec![0.0; output_max]; 1],
            ready: VecDeque::with_capacity(output_max * 2),
            delay_remaining: delay,
            total_in: 0,
            emitted: 0,
            ended: false,
            _sample: PhantomData,
        })
    }

    /// Total number of samples this converter will emit, once input has ended.
    fn expected_total(&self) -> u64 {
        (self.total_in as f64 * self.ratio).round() as u64
    }

    /// Number of converted samples waiting to be handed out.
    #[inline]
    pub fn queued(&self) -> usize {
        self.ready.len()
    }

    /// Queues `produced` frames from the scratch buffer, skipping the kernel delay first.
    fn queue_output(&mut self, produced: usize) {
        let frames = &self.scratch[0][..produced];
        let skip = self.delay_remaining.min(frames.len());
        self.delay_remaining -= skip;
        let frames = &frames[skip..];
        self.ready.extend(frames.iter().copied());
        self.emitted += frames.len() as u64;
    }

    fn convert_full_chunks(&mut self) -> ConvertResult<()> {
        loop {
            let needed = with_kernel!(&self.kernel, r => r.input_frames_next());
            if self.pending.len() < needed {
                return Ok(());
            }
            let (used, produced) = with_kernel!(&mut self.kernel, r => {
                let chunk = [&self.pending[..needed]];
                r.process_into_buffer(&chunk[..], self.scratch.as_mut_slice(), None)?
            });
            self.pending.drain(..used);
            self.queue_output(produced);
        }
    }

    fn flush(&mut self) -> ConvertResult<()> {
        let expected = self.expected_total();
        let mut stalled = 0;

        if !self.pending.is_empty() {
            let (_, produced) = with_kernel!(&mut self.kernel, r => {
                let tail = [&self.pending[..]];
                r.process_partial_into_buffer(Some(&tail[..]), self.scratch.as_mut_slice(), None)?
            });
            self.pending.clear();
            self.queue_output(produced);
        }

        while self.emitted < expected && stalled < MAX_STALLED_FLUSHES {
            let (_, produced) = with_kernel!(&mut self.kernel, r => {
                r.process_partial_into_buffer(None::<&[&[f32]]>, self.scratch.as_mut_slice(), None)?
            });
            if produced == 0 {
                stalled += 1;
            } else {
                stalled = 0;
            }
            self.queue_output(produced);
        }

        let excess = self.emitted.saturating_sub(expected) as usize;
        let excess = excess.min(self.ready.len());
        self.ready.truncate(self.ready.len() - excess);
        self.emitted -= excess as u64;

        log::debug!(
            "Converter flushed: {} samples in, {} samples out",
            self.total_in,
            self.emitted
        );
        Ok(())
    }
}

impl<S: Sample> Converter<S> for RubatoConverter<S> {
    fn process(&mut self, input: Input<'_, S>, output: &mut [S]) -> ConvertResult<usize> {
        match input {
            Input::Data(block) => {
                if self.ended {
                    if block.is_empty() {
                        return Ok(self.drain_into(output));
                    }
                    return Err(ConvertError::InputAfterEnd);
                }
                self.pending.extend(block.iter().map(|&s| s.to_sample_()));
                self.total_in += block.len() as u64;
                self.convert_full_chunks()?;
            }
            Input::EndOfInput => {
                if !self.ended {
                    self.ended = true;
                    self.flush()?;
                }
            }
        }

        Ok(self.drain_into(output))
    }
}

impl<S: Sample> RubatoConverter<S> {
    fn drain_into(&mut self, output: &mut [S]) -> usize {
        let count = output.len().min(self.ready.len());
        for (slot, value) in output.iter_mut().zip(self.ready.drain(..count)) {
            *slot = S::from_sample_(value);
        }
        count
    }
}

impl<S: Sample> Drop for RubatoConverter<S> {
    fn drop(&mut self) {
        log::debug!(
            "Releasing converter ({} samples in, {} samples out, {} undelivered)",
            self.total_in,
            self.emitted,
            self.ready.len()
        );
    }
}
