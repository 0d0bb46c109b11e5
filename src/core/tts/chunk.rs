use bytes::Bytes;
use std::iter::FusedIterator;

/// Fixed-size slices of a synthesized audio buffer.
///
/// Every slice is `size` bytes long except possibly the last one, and the
/// slices share the buffer's memory. Cloning the iterator or calling
/// [`AudioChunks::restart`] replays the sequence from the start.
#[derive(Debug, Clone)]
pub struct AudioChunks {
    buffer: Bytes,
    size: usize,
    offset: usize,
}

impl AudioChunks {
    pub fn restart(&mut self) {
        self.offset = 0;
    }

    pub fn chunk_size(&self) -> usize {
        self.size
    }

    /// Length of the whole buffer being chunked
    pub fn total_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Iterator for AudioChunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.offset >= self.buffer.len() {
            return None;
        }
        let end = self.buffer.len().min(self.offset + self.size);
        let slice = self.buffer.slice(self.offset..end);
        self.offset = end;
        Some(slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.buffer.len() - self.offset).div_ceil(self.size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AudioChunks {}

impl FusedIterator for AudioChunks {}

/// Split `buffer` into slices of `size` bytes. A `size` of zero is treated as one.
pub fn chunk(buffer: Bytes, size: usize) -> AudioChunks {
    AudioChunks {
        buffer,
        size: size.max(1),
        offset: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_sizes_and_concatenation() {
        let buffer: Bytes = (0..50_000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>().into();
        let chunks: Vec<Bytes> = chunk(buffer.clone(), 24_000).collect();

        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![24_000, 24_000, 2_000]);
        assert_eq!(chunks.concat(), buffer.to_vec());
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let chunks = chunk(Bytes::from(vec![7u8; 48_000]), 24_000);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.map(|c| c.len()).all(|len| len == 24_000));
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut chunks = chunk(Bytes::new(), 24_000);
        assert_eq!(chunks.len(), 0);
        assert!(chunks.next().is_none());
    }

    #[test]
    fn test_zero_size_is_treated_as_one() {
        let chunks: Vec<Bytes> = chunk(Bytes::from_static(b"abc"), 0).collect();
        assert_eq!(
            chunks,
            vec![
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
                Bytes::from_static(b"c")
            ]
        );
    }

    #[test]
    fn test_restart_and_clone_replay() {
        let mut chunks = chunk(Bytes::from_static(b"hello world"), 4);
        let snapshot = chunks.clone();

        let first: Vec<Bytes> = chunks.by_ref().collect();
        assert!(chunks.next().is_none());

        chunks.restart();
        let second: Vec<Bytes> = chunks.collect();
        let third: Vec<Bytes> = snapshot.collect();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_chunks_share_buffer_memory() {
        let buffer = Bytes::from(vec![1u8; 10]);
        let first = chunk(buffer.clone(), 5).next().unwrap();
        assert_eq!(first.as_ptr(), buffer.as_ptr());
    }
}
