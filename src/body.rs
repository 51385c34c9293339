use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, SeekFrom};
use tokio::sync::Mutex;

pub const DEFAULT_BODY_CHUNK_SIZE: usize = 64 * 1024;

/// Operation-scoped owner of a request payload that must survive retries.
///
/// One logical operation may need several physical transport attempts, each
/// re-sending the same payload. A naive body adapter hands the reader to the
/// transport, which closes it when the attempt's resources are torn down, so
/// every attempt after the first fails on a dead reader. Here the reader is
/// owned at the operation scope instead: each attempt borrows it through an
/// [`AttemptBody`] handle, and dropping a handle never touches the reader.
/// Only [`ReplayableBody::release`] gives the reader back.
///
/// The reader is read from its current position on every attempt. For
/// seekable readers, [`ReplayableBody::rewind`] repositions it between
/// attempts; for non-seekable readers the caller must buffer upstream or
/// accept that only the first attempt observes the payload from the start.
#[derive(Debug)]
pub struct ReplayableBody<R> {
    reader: Arc<Mutex<R>>,
    chunk_size: usize,
}

impl<R> ReplayableBody<R> {
    pub fn wrap(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_BODY_CHUNK_SIZE)
    }

    /// Like [`ReplayableBody::wrap`], with the chunk size used when the
    /// transport reads from the reader. I/O granularity only; no semantic
    /// effect.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Mints a handle for one physical attempt. Attempts run strictly
    /// sequentially; mint a fresh handle per attempt.
    pub fn attempt(&self) -> AttemptBody<R> {
        AttemptBody {
            reader: Arc::clone(&self.reader),
            chunk_size: self.chunk_size,
        }
    }

    /// Releases the underlying reader. This is the only path that lets the
    /// reader be closed; it fails while an attempt handle is still alive.
    pub fn release(self) -> Result<R, Self> {
        let chunk_size = self.chunk_size;
        Arc::try_unwrap(self.reader)
            .map(Mutex::into_inner)
            .map_err(|reader| Self { reader, chunk_size })
    }
}

impl<R> ReplayableBody<R>
where
    R: AsyncSeek + Unpin,
{
    /// Repositions the reader to the start of the payload, so the next
    /// attempt replays it byte-for-byte.
    pub async fn rewind(&self) -> io::Result<()> {
        let mut reader = self.reader.lock().await;
        reader.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }
}

/// Attempt-scoped borrow of a [`ReplayableBody`]'s reader.
///
/// Freely created and discarded per physical attempt; dropping it is the
/// transport's normal teardown and is a no-op with respect to the reader.
pub struct AttemptBody<R> {
    reader: Arc<Mutex<R>>,
    chunk_size: usize,
}

impl<R> AttemptBody<R>
where
    R: AsyncRead + Unpin,
{
    /// Reads the next chunk of at most the configured chunk size.
    /// `None` at end of payload.
    pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        let mut reader = self.reader.lock().await;
        let mut chunk = vec![0_u8; self.chunk_size];
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            return Ok(None);
        }
        chunk.truncate(read);
        Ok(Some(Bytes::from(chunk)))
    }
}

impl<R> AttemptBody<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Adapts the handle into a chunk stream for transports that consume
    /// `Stream<Item = io::Result<Bytes>>` request bodies.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send {
        futures_util::stream::try_unfold(self, |mut body| async move {
            Ok(body.next_chunk().await?.map(|chunk| (chunk, body)))
        })
    }
}
