#![doc = include_str!("../README.md")]

pub mod config;
pub mod converter;
pub mod io;
pub mod runtime;
pub mod sample;
pub mod sizing;
pub mod timer;

#[allow(unused_imports)]
pub mod prelude {
    pub use crate::config::StreamConfig;
    pub use crate::converter::{
        ConvertError, Converter, ConverterSpec, Input, QualityRecipe, QualitySpec,
        RubatoConverter, RuntimeSpec,
    };
    pub use crate::io::{
        RawSink, RawSource, SampleSink, SampleSource, SliceSource, WavSink, WavSource,
    };
    pub use crate::runtime::{Phase, Runtime, RuntimeError, RuntimeResult, StreamReport};
    pub use crate::sample::{Datatype, Sample};
    pub use crate::sizing::{size_buffers, BufferSizes};
    pub use crate::timer::Stopwatch;
}
