//! Async frame I/O over any byte stream.
//!
//! - Reads loop until the exact byte count is met; partial reads are normal.
//! - A stream that closes early yields `FrameRead::EndOfStream`, not an error.
//! - Frames above `max_frame_bytes` are `InvalidData` (protocol violation).

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use chatline_core::protocol::frame::{payload_len, FrameRead, LEN_PREFIX};

/// Fill `buf` from `r`, returning how many bytes arrived before the stream closed.
async fn read_full<R>(r: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one length-prefixed frame.
pub async fn read_frame<R>(r: &mut R, max_frame_bytes: usize) -> io::Result<FrameRead>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LEN_PREFIX];
    if read_full(r, &mut prefix).await? < LEN_PREFIX {
        return Ok(FrameRead::EndOfStream);
    }

    let Some(len) = payload_len(prefix) else {
        return Ok(FrameRead::EndOfStream);
    };
    if len > max_frame_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds limit of {max_frame_bytes}"),
        ));
    }

    let mut payload = BytesMut::zeroed(len);
    if read_full(r, &mut payload).await? < len {
        return Ok(FrameRead::EndOfStream);
    }
    Ok(FrameRead::Frame(payload.freeze()))
}

/// Write an already-encoded frame and flush.
pub async fn write_frame<W>(w: &mut W, frame: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    w.write_all(frame).await?;
    w.flush().await
}
