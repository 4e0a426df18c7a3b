//! Native messaging framing: a 4-byte little-endian length, then the payload.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted from the browser. Longer frames are drained and rejected.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

const LENGTH_PREFIX_LEN: usize = 4;

/// A frame read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Vec<u8>),
    /// A frame longer than [`MAX_FRAME_LEN`]; its payload was discarded
    Oversized(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream ended inside a frame ({received} of {expected} bytes)")]
    Truncated { expected: usize, received: usize },

    #[error("Payload of {0} bytes does not fit in a frame")]
    PayloadTooLarge(usize),
}

/// Read one frame. Returns `None` on a clean end of stream at a frame boundary.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let received = read_full(reader, &mut prefix).await?;
    if received == 0 {
        return Ok(None);
    }
    if received < LENGTH_PREFIX_LEN {
        return Err(FrameError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            received,
        });
    }

    let len = u32::from_le_bytes(prefix);
    if len > MAX_FRAME_LEN {
        let mut payload = (&mut *reader).take(u64::from(len));
        let drained = tokio::io::copy(&mut payload, &mut tokio::io::sink()).await?;
        if drained < u64::from(len) {
            return Err(FrameError::Truncated {
                expected: len as usize,
                received: drained as usize,
            });
        }
        return Ok(Some(Frame::Oversized(len)));
    }

    let mut payload = vec![0u8; len as usize];
    let received = read_full(reader, &mut payload).await?;
    if received < payload.len() {
        return Err(FrameError::Truncated {
            expected: payload.len(),
            received,
        });
    }
    Ok(Some(Frame::Message(payload)))
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let len =
        u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Fill `buf` until it is full or the stream ends. Returns the bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
