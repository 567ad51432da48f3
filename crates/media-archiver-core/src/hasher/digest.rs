use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_LENGTH: usize = 64 * 1024; // 64KB

/// BLAKE3 digest of a file's full content.
///
/// Serves two separate checks in the archive engine: duplicate detection
/// against an existing destination with the same derived name, and integrity
/// verification of freshly written bytes.
pub type ContentDigest = blake3::Hash;

/// Stream a file through BLAKE3 in fixed-size chunks.
pub fn digest_file(file: &Path) -> io::Result<ContentDigest> {
    let mut f = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; CHUNK_LENGTH];
    loop {
        let bytes_read = match f.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize())
}

/// Compare a file on disk against a digest computed earlier.
pub fn matches_digest(file: &Path, expected: &ContentDigest) -> io::Result<bool> {
    Ok(digest_file(file)? == *expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_digest_matches_in_memory_hash() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("clip.mp4");
        // Spans several chunks with a ragged tail.
        let data: Vec<u8> = (0..(CHUNK_LENGTH * 3 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(digest_file(&path).unwrap(), blake3::hash(&data));
    }

    #[test]
    fn test_empty_file_digest() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("empty.wav");
        fs::write(&path, b"").unwrap();
        assert_eq!(digest_file(&path).unwrap(), blake3::hash(b""));
    }

    #[test]
    fn test_matches_digest_detects_difference() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.jpg");
        let b = tmp.path().join("b.jpg");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"other bytes").unwrap();

        let expected = digest_file(&a).unwrap();
        assert!(matches_digest(&a, &expected).unwrap());
        assert!(!matches_digest(&b, &expected).unwrap());
    }

    #[test]
    fn test_missing_file_is_error() {
        let tmp = tempdir().unwrap();
        assert!(digest_file(&tmp.path().join("nope.mov")).is_err());
    }
}
