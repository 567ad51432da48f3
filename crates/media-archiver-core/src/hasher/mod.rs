pub mod digest;

pub use digest::{digest_file, matches_digest, ContentDigest};
