//! Reading and writing serialized containers through `std::io` and the filesystem.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::container::Container;
use crate::error::ErafError;
use crate::header::HEADER_LEN;

impl Container {
    /// Write the serialized container to `writer`. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::Io`] if the writer fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize, ErafError> {
        let bytes = self.serialize();
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }

    /// Read `reader` to its end and decode the bytes as one container.
    ///
    /// # Errors
    ///
    /// - [`ErafError::Io`] if reading fails.
    /// - Any error of [`Container::deserialize`]; an empty stream yields
    ///   [`ErafError::BufferTooSmall`].
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, ErafError> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        reader.read_to_end(&mut bytes)?;
        Container::deserialize(&bytes)
    }

    /// Serialize to a file at `path`, creating or truncating it.
    ///
    /// On Unix a newly created file is readable and writable by its owner only.
    ///
    /// # Errors
    ///
    /// Returns [`ErafError::Io`] if the file cannot be created or written.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<usize, ErafError> {
        let path = path.as_ref();
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path)?;
        let written = self.write_to(file)?;
        debug!(path = %path.display(), bytes = written, "container written");
        Ok(written)
    }

    /// Read and decode the container stored at `path`.
    ///
    /// # Errors
    ///
    /// As [`Container::read_from`].
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, ErafError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "container read");
        Container::deserialize(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::Field;

    fn sample() -> Container {
        let mut c = Container::new();
        c.set_version(2, 0, 1)
            .set_field(Field::Email, "email@address.com")
            .set_field(Field::Token, "t0k3n");
        c
    }

    #[test]
    fn stream_round_trip() {
        let c = sample();
        let mut buf = Vec::new();
        let n = c.write_to(&mut buf).unwrap();
        assert_eq!(n, c.total_len());
        assert_eq!(buf, c.serialize());
        let decoded = Container::read_from(buf.as_slice()).unwrap();
        assert_eq!(decoded, c);
    }

    #[test]
    fn empty_stream_is_too_small() {
        let err = Container::read_from(std::io::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.eraf");
        let c = sample();
        c.write_to_path(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), c.serialize());
        assert_eq!(Container::read_from_path(&path).unwrap(), c);
    }

    #[test]
    fn overwrite_truncates_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.eraf");
        sample()
            .with_field(Field::Certificate, vec![1u8; 4096])
            .write_to_path(&path)
            .unwrap();
        let small = Container::new();
        small.write_to_path(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 53);
        assert_eq!(Container::read_from_path(&path).unwrap(), small);
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.eraf");
        sample().write_to_path(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Container::read_from_path(dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
