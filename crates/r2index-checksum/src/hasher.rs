//! Four-way digest accumulator.

use std::fmt;
use std::io;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::ChecksumResult;

/// Feeds every chunk to MD5, SHA-1, SHA-256 and SHA-512 in the same order
///
/// Digest updates are chunk-boundary agnostic: any split of the same byte
/// sequence produces the same result.
///
/// Also usable as an [`io::Write`] sink:
///
/// ```
/// use r2index_checksum::MultiHasher;
///
/// let mut hasher = MultiHasher::new();
/// std::io::copy(&mut &b"Hello, World!"[..], &mut hasher)?;
/// let result = hasher.finalize();
/// assert_eq!(result.size, 13);
/// assert_eq!(result.md5, "65a8e27d8879283831b664bd8b7f0ad4");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct MultiHasher {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
    sha512: Sha512,
    size: u64,
}

impl MultiHasher {
    /// Create an accumulator for the empty input
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk into all four digests
    pub fn update(&mut self, chunk: &[u8]) {
        self.md5.update(chunk);
        self.sha1.update(chunk);
        self.sha256.update(chunk);
        self.sha512.update(chunk);
        self.size += chunk.len() as u64;
    }

    /// Bytes absorbed so far
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the accumulator and produce lowercase hex digests
    #[must_use]
    pub fn finalize(self) -> ChecksumResult {
        ChecksumResult {
            md5: hex::encode(self.md5.finalize()),
            sha1: hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
            sha512: hex::encode(self.sha512.finalize()),
            size: self.size,
        }
    }
}

impl fmt::Debug for MultiHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiHasher")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl io::Write for MultiHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Splitting the input at any point gives the same digests and size
        #[test]
        fn split_point_is_irrelevant(
            data in prop::collection::vec(any::<u8>(), 0..1024),
            at in any::<prop::sample::Index>(),
        ) {
            let at = at.index(data.len() + 1);

            let mut whole = MultiHasher::new();
            whole.update(&data);

            let mut split = MultiHasher::new();
            split.update(&data[..at]);
            split.update(&data[at..]);
            prop_assert_eq!(split.size(), data.len() as u64);

            prop_assert_eq!(whole.finalize(), split.finalize());
        }
    }

    #[test]
    fn empty_input_digests() {
        let result = MultiHasher::new().finalize();
        assert_eq!(result.size, 0);
        assert_eq!(result.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(result.sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            result.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            result.sha512,
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn split_updates_match_single_update() {
        let data = b"The quick brown fox jumps over the lazy dog";

        let mut whole = MultiHasher::new();
        whole.update(data);

        let mut split = MultiHasher::new();
        for piece in data.chunks(7) {
            split.update(piece);
        }
        split.update(&[]);

        assert_eq!(whole.finalize(), split.finalize());
    }

    #[test]
    fn size_tracks_updates() {
        let mut hasher = MultiHasher::new();
        hasher.update(b"abc");
        hasher.update(b"de");
        assert_eq!(hasher.size(), 5);
    }

    #[test]
    fn debug_hides_digest_state() {
        let hasher = MultiHasher::new();
        assert_eq!(format!("{hasher:?}"), "MultiHasher { size: 0, .. }");
    }
}
