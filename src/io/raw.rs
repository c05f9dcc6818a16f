//! Raw, headerless little-endian sample streams.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, ErrorKind, Read, Write},
    marker::PhantomData,
    path::Path,
};

use super::{SampleSink, SampleSource};
use crate::sample::Sample;

/// Reads samples from a raw byte stream.
///
/// A trailing partial sample at the end of the stream is discarded.
pub struct RawSource<R, S> {
    reader: R,
    bytes: Vec<u8>,
    _sample: PhantomData<S>,
}

impl<S: Sample> RawSource<BufReader<File>, S> {
    /// Opens a raw sample file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read, S: Sample> RawSource<R, S> {
    /// Creates a source reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::new(),
            _sample: PhantomData,
        }
    }

    /// Consumes the source, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Fills `self.bytes` as far as the reader allows, returning the number of bytes read.
    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read, S: Sample> SampleSource<S> for RawSource<R, S> {
    fn read(&mut self, buf: &mut [S]) -> io::Result<usize> {
        self.bytes.resize(buf.len() * S::BYTES, 0);
        let filled = self.fill()?;

        let count = filled / S::BYTES;
        if filled % S::BYTES != 0 {
            log::warn!(
                "Discarding {} trailing bytes of a partial {} sample",
                filled % S::BYTES,
                S::DATATYPE
            );
        }

        for (slot, bytes) in buf.iter_mut().zip(self.bytes[..count * S::BYTES].chunks_exact(S::BYTES)) {
            *slot = S::from_le_slice(bytes);
        }
        Ok(count)
    }
}

/// Writes samples to a raw byte stream.
pub struct RawSink<W, S> {
    writer: W,
    bytes: Vec<u8>,
    _sample: PhantomData<S>,
}

impl<S: Sample> RawSink<BufWriter<File>, S> {
    /// Creates (or truncates) a raw sample file.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write, S: Sample> RawSink<W, S> {
    /// Creates a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes: Vec::new(),
            _sample: PhantomData,
        }
    }

    /// Consumes the sink, returning the underlying writer.
    ///
    /// Buffered data is not flushed; call [`SampleSink::flush`] first.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write, S: Sample> SampleSink<S> for RawSink<W, S> {
    fn write(&mut self, buf: &[S]) -> io::Result<usize> {
        self.bytes.clear();
        for sample in buf {
            sample.extend_le(&mut self.bytes);
        }
        self.writer.write_all(&self.bytes)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
