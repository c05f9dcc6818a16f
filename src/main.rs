use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use resample_stream::prelude::*;

/// Resample a raw or WAV mono sample stream.
#[derive(Debug, Parser)]
#[command(name = "resample-stream", version)]
struct Cli {
    /// Quality tier, 0 (quick) to 10. 4 is high quality, 6 very high.
    #[arg(default_value_t = 4)]
    quality: u32,

    /// Input file. Raw little-endian samples, or WAV if the name ends in `.wav`.
    #[arg(default_value = "input.pcm")]
    input: PathBuf,

    /// Output file. Raw little-endian samples, or WAV if the name ends in `.wav`.
    #[arg(default_value = "output.pcm")]
    output: PathBuf,

    /// Input sample rate in Hz. Ignored for WAV input, which declares its own.
    #[arg(long, default_value_t = resample_stream::config::DEFAULT_INPUT_RATE)]
    input_rate: f64,

    /// Output sample rate in Hz.
    #[arg(long, default_value_t = resample_stream::config::DEFAULT_OUTPUT_RATE)]
    output_rate: f64,

    /// Total samples shared by the input and output buffers.
    #[arg(long, default_value_t = resample_stream::config::DEFAULT_BUFFER_BUDGET)]
    budget: usize,

    /// Worker threads for the converter. 0 and 1 both mean single-threaded.
    #[arg(long, default_value_t = 1)]
    threads: u32,

    /// Sample encoding of both files.
    #[arg(long, default_value_t = Datatype::Int16)]
    datatype: Datatype,
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

enum Source<S: Sample> {
    Raw(RawSource<BufReader<File>, S>),
    Wav(WavSource<BufReader<File>, S>),
}

impl<S: Sample> SampleSource<S> for Source<S> {
    fn read(&mut self, buf: &mut [S]) -> std::io::Result<usize> {
        match self {
            Source::Raw(source) => source.read(buf),
            Source::Wav(source) => source.read(buf),
        }
    }
}

enum Sink<S: Sample> {
    Raw(RawSink<BufWriter<File>, S>),
    Wav(WavSink<BufWriter<File>, S>),
}

impl<S: Sample> SampleSink<S> for Sink<S> {
    fn write(&mut self, buf: &[S]) -> std::io::Result<usize> {
        match self {
            Sink::Raw(sink) => sink.write(buf),
            Sink::Wav(sink) => sink.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Raw(sink) => sink.flush(),
            Sink::Wav(sink) => sink.flush(),
        }
    }
}

/// Counts the samples in the input file, for the start-up summary.
fn count_samples(path: &Path, datatype: Datatype) -> std::io::Result<u64> {
    if is_wav(path) {
        let reader = hound::WavReader::open(path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(reader.len() as u64)
    } else {
        Ok(std::fs::metadata(path)?.len() / datatype.bytes() as u64)
    }
}

fn convert<S: Sample>(cli: &Cli, mut config: StreamConfig) -> RuntimeResult<StreamReport> {
    let source = if is_wav(&cli.input) {
        let source = WavSource::<_, S>::open(&cli.input)?;
        config.input_rate = source.sample_rate() as f64;
        Source::Wav(source)
    } else {
        Source::Raw(RawSource::open(&cli.input)?)
    };

    let sink = if is_wav(&cli.output) {
        Sink::Wav(WavSink::create(&cli.output, config.output_rate.round() as u32)?)
    } else {
        Sink::Raw(RawSink::create(&cli.output)?)
    };

    log::info!(
        "Converting {} Hz -> {} Hz with quality {}",
        config.input_rate,
        config.output_rate,
        config.quality.recipe
    );

    Runtime::<S, _>::with_config(&config)?.run(source, sink)
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let recipe = match QualityRecipe::from_number(cli.quality) {
        Ok(recipe) => recipe,
        Err(e) => {
            eprintln!("resample-stream: {e}");
            return ExitCode::from(e.code() as u8);
        }
    };

    let config = StreamConfig {
        input_rate: cli.input_rate,
        output_rate: cli.output_rate,
        buffer_budget: cli.budget,
        datatype: cli.datatype,
        quality: QualitySpec::new(recipe),
        runtime: RuntimeSpec::new(cli.threads),
    };

    let num_samples = match count_samples(&cli.input, cli.datatype) {
        Ok(n) => n.to_string(),
        Err(e) => {
            eprintln!("resample-stream: bad input file {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    println!(
        "quality={} input={} output={} num_samples={}",
        recipe.number(),
        cli.input.display(),
        cli.output.display(),
        num_samples
    );

    let mut stopwatch = Stopwatch::new();
    stopwatch.start();
    let result = match cli.datatype {
        Datatype::Int16 => convert::<i16>(&cli, config),
        Datatype::Int32 => convert::<i32>(&cli, config),
        Datatype::Float32 => convert::<f32>(&cli, config),
    };
    stopwatch.stop();
    println!("elapsed_micros={}", stopwatch.elapsed_micros());

    match result {
        Ok(report) => {
            eprintln!(
                "resample-stream: no error; {} samples in, {} samples out",
                report.samples_read, report.samples_written
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("resample-stream: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["resample-stream"]);
        assert_eq!(cli.quality, 4);
        assert_eq!(cli.input, PathBuf::from("input.pcm"));
        assert_eq!(cli.output, PathBuf::from("output.pcm"));
        assert_eq!(cli.input_rate, 16_000.0);
        assert_eq!(cli.output_rate, 8_000.0);
        assert_eq!(cli.budget, 1024);
        assert_eq!(cli.threads, 1);
        assert_eq!(cli.datatype, Datatype::Int16);
    }

    #[test]
    fn test_cli_positional_and_flags() {
        let cli = Cli::parse_from([
            "resample-stream",
            "6",
            "in.wav",
            "out.raw",
            "--output-rate",
            "48000",
            "--datatype",
            "f32",
        ]);
        assert_eq!(cli.quality, 6);
        assert!(is_wav(&cli.input));
        assert!(!is_wav(&cli.output));
        assert_eq!(cli.output_rate, 48_000.0);
        assert_eq!(cli.datatype, Datatype::Float32);
    }

    #[test]
    fn test_convert_raw_file() {
        let dir = std::env::temp_dir().join(format!("resample-stream-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.pcm");
        let output = dir.join("out.wav");

        let mut sink = RawSink::<_, i16>::create(&input).unwrap();
        let samples: Vec<i16> = (0..4_000).map(|i| ((i % 100) * 50) as i16).collect();
        sink.write(&samples).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let cli = Cli::parse_from([
            OsStr::new("resample-stream"),
            OsStr::new("0"),
            input.as_os_str(),
            output.as_os_str(),
        ]);
        let report = convert::<i16>(&cli, StreamConfig::default()).unwrap();
        assert_eq!(report.samples_read, 4_000);
        assert_eq!(report.samples_written, 2_000);

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.len(), 2_000);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
