use filetime::FileTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Writes a copy of a source file to a destination that must not exist yet.
///
/// The archive engine verifies every copy afterwards, so implementations only
/// need to report I/O failures. Tests plug in copiers that corrupt output.
pub trait FileCopier: Send + Sync {
    /// Returns the number of bytes written. Fails with
    /// [`io::ErrorKind::AlreadyExists`] if `destination` is already taken.
    fn copy(&self, source: &Path, destination: &Path) -> io::Result<u64>;
}

/// Byte copy that also carries over permissions and access/modification times.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreservingCopier;

impl FileCopier for PreservingCopier {
    fn copy(&self, source: &Path, destination: &Path) -> io::Result<u64> {
        let metadata = fs::metadata(source)?;

        let mut reader = BufReader::new(File::open(source)?);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)?;
        let mut writer = BufWriter::new(file);
        let bytes = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        filetime::set_file_times(
            destination,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )?;
        fs::set_permissions(destination, metadata.permissions())?;

        Ok(bytes)
    }
}
