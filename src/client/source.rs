//! Byte sources a file upload reads its parts from.
//!
//! A part body is a lazy stream: nothing is read until the transport polls
//! it, and then only one chunk at a time, so memory stays bounded by the
//! number of parts in flight rather than the size of the file.

use bytes::Bytes;
use futures::{
    StreamExt, TryStreamExt,
    future,
    stream::{self, BoxStream},
};
use std::{
    io::{self, ErrorKind, SeekFrom},
    ops::Range,
    path::{Path, PathBuf},
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::io::ReaderStream;

/// Chunks of one part, in order.
pub type PartStream = BoxStream<'static, io::Result<Bytes>>;

/// A source of known total length that can stream arbitrary byte ranges.
pub trait PartSource: Send + Sync {
    /// Total size in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream exactly `range` in chunks of at most `chunk_size` bytes.
    fn stream_range(&self, range: Range<u64>, chunk_size: usize) -> PartStream;
}

fn check_range(range: &Range<u64>, len: u64) -> io::Result<()> {
    if range.start > range.end || range.end > len {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("range {:?} outside source of {} bytes", range, len),
        ));
    }
    Ok(())
}

fn failed(err: io::Error) -> PartStream {
    stream::once(future::ready(Err(err))).boxed()
}

/// In-memory source; chunks are zero-copy slices.
impl PartSource for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn stream_range(&self, range: Range<u64>, chunk_size: usize) -> PartStream {
        if let Err(err) = check_range(&range, PartSource::len(self)) {
            return failed(err);
        }
        let part = self.slice(range.start as usize..range.end as usize);
        let total = part.len();
        let chunk_size = chunk_size.max(1);

        stream::iter((0..total).step_by(chunk_size).map(move |start| {
            Ok(part.slice(start..(start + chunk_size).min(total)))
        }))
        .boxed()
    }
}

/// A file on disk. Each part stream opens its own handle when first polled,
/// so concurrent part uploads never share a cursor.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
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
}

impl PartSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn stream_range(&self, range: Range<u64>, chunk_size: usize) -> PartStream {
        if let Err(err) = check_range(&range, self.len) {
            return failed(err);
        }
        let path = self.path.clone();
        let len = range.end - range.start;

        stream::once(async move {
            let mut file = File::open(&path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;
            let part = file.take(len);
            Ok::<_, io::Error>(ReaderStream::with_capacity(part, chunk_size.max(1)))
        })
        .try_flatten()
        .boxed()
    }
}
