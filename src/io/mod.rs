//! Sources and sinks of sample streams.

use std::io;

use crate::sample::Sample;

mod raw;
mod wav;

pub use raw::{RawSink, RawSource};
pub use wav::{WavSink, WavSource};

/// Something samples can be read from.
pub trait SampleSource<S: Sample> {
    /// Reads up to `buf.len()` samples into `buf`, returning how many were read.
    ///
    /// Fewer samples than requested are returned only at the end of the stream; `Ok(0)` means
    /// the stream is exhausted.
    fn read(&mut self, buf: &mut [S]) -> io::Result<usize>;
}

/// Something samples can be written to.
pub trait SampleSink<S: Sample> {
    /// Writes the samples in `buf`, returning how many were accepted.
    fn write(&mut self, buf: &[S]) -> io::Result<usize>;

    /// Flushes anything buffered by the sink.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Sample, T: SampleSource<S> + ?Sized> SampleSource<S> for &mut T {
    #[inline]
    fn read(&mut self, buf: &mut [S]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

impl<S: Sample, T: SampleSink<S> + ?Sized> SampleSink<S> for &mut T {
    #[inline]
    fn write(&mut self, buf: &[S]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// An in-memory source reading from a slice.
#[derive(Debug, Clone)]
pub struct SliceSource<'a, S> {
    samples: &'a [S],
    position: usize,
}

impl<'a, S> SliceSource<'a, S> {
    /// Creates a source over the given samples.
    pub fn new(samples: &'a [S]) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Number of samples not yet read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl<S: Sample> SampleSource<S> for SliceSource<'_, S> {
    fn read(&mut self, buf: &mut [S]) -> io::Result<usize> {
        let count = buf.len().min(self.remaining());
        buf[..count].copy_from_slice(&self.samples[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

/// An in-memory sink collecting everything written to it.
impl<S: Sample> SampleSink<S> for Vec<S> {
    fn write(&mut self, buf: &[S]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source() {
        let data = [1i16, 2, 3, 4, 5];
        let mut source = SliceSource::new(&data);
        let mut buf = [0i16; 2];
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(source.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<f32> = Vec::new();
        assert_eq!(SampleSink::write(&mut sink, &[0.5, -0.5]).unwrap(), 2);
        assert_eq!(SampleSink::write(&mut sink, &[]).unwrap(), 0);
        assert_eq!(sink, vec![0.5, -0.5]);
    }
}
