//! Byte sources a transmitter can slice

use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Random-access source of known size
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Total size in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly `range`, which must lie within `0..len()`
    async fn read_range(&self, range: Range<u64>) -> std::io::Result<Bytes>;
}

fn check_range(range: &Range<u64>, len: u64) -> std::io::Result<()> {
    if range.start > range.end || range.end > len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("range {:?} outside source of {} bytes", range, len),
        ));
    }
    Ok(())
}

/// In-memory source
#[derive(Clone, Debug)]
pub struct MemorySource(Bytes);

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.0.len() as u64
    }

    async fn read_range(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        check_range(&range, self.len())?;
        Ok(self.0.slice(range.start as usize..range.end as usize))
    }
}

/// File on disk; each read opens the file, so the source stays `Sync`
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(Self {
            path,
            len: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used as the uploaded file name
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    async fn read_range(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        check_range(&range, self.len)?;
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(range.start)).await?;

        let mut buffer = vec![0u8; (range.end - range.start) as usize];
        file.read_exact(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_slices() {
        let source = MemorySource::new(b"hello world".to_vec());
        assert_eq!(source.len(), 11);
        assert_eq!(&source.read_range(6..11).await.unwrap()[..], b"world");
        assert!(source.read_range(6..12).await.is_err());
    }

    #[tokio::test]
    async fn file_source_reads_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let source = FileSource::open(&path).await.unwrap();
        assert_eq!(source.len(), 10);
        assert_eq!(source.file_name().as_deref(), Some("data.bin"));
        assert_eq!(&source.read_range(3..7).await.unwrap()[..], b"3456");
        assert!(source.read_range(0..0).await.unwrap().is_empty());
        assert!(source.read_range(8..11).await.is_err());
    }

    #[tokio::test]
    async fn file_source_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileSource::open(dir.path()).await.is_err());
    }
}
