use crate::{
    config::StreamConfig,
    converter::{ConvertError, Converter, Input, RubatoConverter},
    io::{SampleSink, SampleSource},
    sample::Sample,
    sizing::BufferSizes,
};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("Converter error: {0}")]
    Convert(#[from] ConvertError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sink accepted {accepted} of {expected} samples")]
    ShortWrite { expected: usize, accepted: usize },
}

impl RuntimeError {
    /// A non-zero process exit status for this error.
    ///
    /// Converter errors map to their own code, everything else to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::Convert(e) => e.code(),
            _ => 1,
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Where the streaming loop is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Input is still being read and fed to the converter.
    Feeding,
    /// Input is exhausted; the converter is being drained.
    Flushing,
    /// Everything has been delivered.
    Done,
}

/// Statistics of a completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    /// Samples read from the source.
    pub samples_read: u64,
    /// Samples accepted by the sink.
    pub samples_written: u64,
    /// Number of loop iterations, i.e. converter calls.
    pub iterations: u64,
    /// The iteration on which input ran out and flushing began.
    pub flush_started: Option<u64>,
}

/// The streaming conversion runtime.
///
/// The runtime owns the converter and a pair of fixed-capacity sample blocks. [`run`](Runtime::run)
/// moves a stream from a source to a sink through them one block at a time:
///
/// - While feeding, a block of input is read whenever the converter asked for more. The first
///   empty read switches to flushing.
/// - While flushing, the converter is handed [`Input::EndOfInput`] on every call.
/// - Whatever the converter produced is written to the sink.
/// - The loop ends once the converter neither wants more input nor has anything left to write.
///
/// The converter is dropped when the run ends, whatever the outcome.
pub struct Runtime<S: Sample, C: Converter<S>> {
    converter: C,
    input: Box<[S]>,
    output: Box<[S]>,
    phase: Phase,
    report: StreamReport,
}

impl<S: Sample> Runtime<S, RubatoConverter<S>> {
    /// Creates a runtime with a [`RubatoConverter`] set up from the given configuration.
    pub fn with_config(config: &StreamConfig) -> RuntimeResult<Self> {
        if config.datatype != S::DATATYPE {
            log::warn!(
                "Configured for {} samples but running with {}",
                config.datatype,
                S::DATATYPE
            );
        }
        let converter = RubatoConverter::new(config.converter_spec())?;
        Ok(Self::new(converter, config.buffer_sizes()))
    }
}

impl<S: Sample, C: Converter<S>> Runtime<S, C> {
    /// Creates a runtime around `converter` with buffers of the given capacities.
    pub fn new(converter: C, sizes: BufferSizes) -> Self {
        Self {
            converter,
            input: vec![S::default(); sizes.input].into_boxed_slice(),
            output: vec![S::default(); sizes.output].into_boxed_slice(),
            phase: Phase::Feeding,
            report: StreamReport::default(),
        }
    }

    /// The capacities of the input and output blocks.
    pub fn buffer_sizes(&self) -> BufferSizes {
        BufferSizes {
            input: self.input.len(),
            output: self.output.len(),
        }
    }

    /// Streams everything from `source` through the converter into `sink`.
    ///
    /// A converter or I/O error stops the run at once and is returned. Samples written before
    /// the failure stay in the sink.
    pub fn run<I, O>(mut self, mut source: I, mut sink: O) -> RuntimeResult<StreamReport>
    where
        I: SampleSource<S>,
        O: SampleSink<S>,
    {
        log::debug!(
            "Streaming with an input block of {} and an output block of {} samples",
            self.input.len(),
            self.output.len()
        );

        if let Err(e) = self.stream(&mut source, &mut sink) {
            log::error!(
                "Stream failed on iteration {} after writing {} samples: {e}",
                self.report.iterations,
                self.report.samples_written
            );
            return Err(e);
        }

        sink.flush()?;

        log::debug!("Stream finished: {:?}", self.report);
        Ok(self.report)
    }

    fn stream<I, O>(&mut self, source: &mut I, sink: &mut O) -> RuntimeResult<()>
    where
        I: SampleSource<S>,
        O: SampleSink<S>,
    {
        let mut need_input = true;

        while self.phase != Phase::Done {
            self.report.iterations += 1;

            let mut len = 0;
            if self.phase == Phase::Feeding && need_input {
                len = source.read(&mut self.input)?;
                self.report.samples_read += len as u64;
                if len == 0 {
                    log::debug!("Input exhausted on iteration {}", self.report.iterations);
                    self.phase = Phase::Flushing;
                    self.report.flush_started = Some(self.report.iterations);
                }
            }

            let input = match self.phase {
                Phase::Feeding => Input::Data(&self.input[..len]),
                _ => Input::EndOfInput,
            };
            let produced = self.converter.process(input, &mut self.output)?;
            debug_assert!(produced <= self.output.len());

            let written = if produced > 0 {
                sink.write(&self.output[..produced])?
            } else {
                0
            };
            self.report.samples_written += written as u64;
            if written < produced {
                return Err(RuntimeError::ShortWrite {
                    expected: produced,
                    accepted: written,
                });
            }

            // Ask for fresh input only while there is input left and the converter had room to spare.
            need_input = produced < self.output.len() && self.phase == Phase::Feeding;

            log::trace!(
                "Iteration {}: read {len}, produced {produced}, need input: {need_input}",
                self.report.iterations
            );

            if !need_input && written == 0 {
                self.phase = Phase::Done;
            }
        }

        Ok(())
    }
}
