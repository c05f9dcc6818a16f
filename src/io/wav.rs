//! Mono WAV sample streams.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};

use super::{SampleSink, SampleSource};
use crate::sample::Sample;

fn to_io_error(error: hound::Error) -> io::Error {
    match error {
        hound::Error::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Reads samples from a mono WAV stream.
pub struct WavSource<R: Read, S: hound::Sample> {
    samples: hound::WavIntoSamples<R, S>,
    spec: hound::WavSpec,
}

impl<S: Sample> WavSource<BufReader<File>, S> {
    /// Opens a WAV file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read, S: Sample> WavSource<R, S> {
    /// Creates a source from a WAV stream.
    ///
    /// Fails if the stream is not mono or its encoding does not match `S`.
    pub fn new(reader: R) -> io::Result<Self> {
        let reader = hound::WavReader::new(reader).map_err(to_io_error)?;
        let spec = reader.spec();
        let expected = S::DATATYPE.wav_spec(spec.sample_rate);

        if spec.channels != 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected a mono WAV stream, got {} channels", spec.channels),
            ));
        }
        if spec.sample_format != expected.sample_format
            || spec.bits_per_sample != expected.bits_per_sample
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "WAV stream holds {}-bit {:?} samples, expected {}",
                    spec.bits_per_sample,
                    spec.sample_format,
                    S::DATATYPE
                ),
            ));
        }

        log::debug!("Reading WAV stream: {:?}", spec);

        Ok(Self {
            samples: reader.into_samples::<S>(),
            spec,
        })
    }

    /// The sample rate declared by the WAV header.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }
}

impl<R: Read, S: Sample> SampleSource<S> for WavSource<R, S> {
    fn read(&mut self, buf: &mut [S]) -> io::Result<usize> {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.samples.next() {
                Some(sample) => *slot = sample.map_err(to_io_error)?,
                None => break,
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Writes samples to a mono WAV stream.
///
/// The header is finalized when the sink is dropped; call [`SampleSink::flush`] to observe errors.
pub struct WavSink<W: Write + Seek, S> {
    writer: hound::WavWriter<W>,
    _sample: std::marker::PhantomData<S>,
}

impl<S: Sample> WavSink<BufWriter<File>, S> {
    /// Creates (or truncates) a WAV file.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?), sample_rate)
    }
}

impl<W: Write + Seek, S: Sample> WavSink<W, S> {
    /// Creates a sink writing a WAV stream at `sample_rate` to `writer`.
    pub fn new(writer: W, sample_rate: u32) -> io::Result<Self> {
        let spec = S::DATATYPE.wav_spec(sample_rate);
        let writer = hound::WavWriter::new(writer, spec).map_err(to_io_error)?;
        Ok(Self {
            writer,
            _sample: std::marker::PhantomData,
        })
    }

    /// Finalizes the WAV header.
    pub fn finalize(self) -> io::Result<()> {
        self.writer.finalize().map_err(to_io_error)
    }
}

impl<W: Write + Seek, S: Sample> SampleSink<S> for WavSink<W, S> {
    fn write(&mut self, buf: &[S]) -> io::Result<usize> {
        for &sample in buf {
            self.writer.write_sample(sample).map_err(to_io_error)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().map_err(to_io_error)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_wav_roundtrip() {
        let samples: Vec<i16> = (0..1000).map(|i| (i * 17 % 2000 - 1000) as i16).collect();

        let mut cursor = Cursor::new(Vec::new());
        let mut sink = WavSink::<_, i16>::new(&mut cursor, 8_000).unwrap();
        for chunk in samples.chunks(333) {
            assert_eq!(sink.write(chunk).unwrap(), chunk.len());
        }
        sink.finalize().unwrap();

        cursor.set_position(0);
        let mut source = WavSource::<_, i16>::new(cursor).unwrap();
        assert_eq!(source.sample_rate(), 8_000);

        let mut read = Vec::new();
        let mut buf = [0i16; 256];
        loop {
            let n = source.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            read.extend_from_slice(&buf[..n]);
        }
        assert_eq!(read, samples);
    }

    #[test]
    fn test_wav_encoding_mismatch() {
        let mut cursor = Cursor::new(Vec::new());
        let sink = WavSink::<_, f32>::new(&mut cursor, 16_000).unwrap();
        sink.finalize().unwrap();

        cursor.set_position(0);
        let err = WavSource::<_, i16>::new(cursor).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_not_a_wav_stream() {
        let err = WavSource::<_, i16>::new(Cursor::new(vec![0u8; 64])).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
