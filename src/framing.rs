//! Wire framing: 4-byte big-endian length prefix + raw payload
//!
//! Both directions use the same frame layout, so these helpers serve the
//! server and any test client alike. They are generic over tokio's async
//! I/O traits, which lets unit tests run against in-memory duplex streams.
//!
//! A frame transfer either completes in full within the bounded wait or
//! fails; a short transfer is never reported as success. Timeouts and peer
//! closes are distinct `ChatError` variants so callers can tell an
//! unresponsive peer from a departed one.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::ChatError;

/// Bound on a single frame transfer in either direction.
///
/// An unresponsive peer fails its own operation once this elapses and the
/// connection is treated as dead; no other task is affected by the wait.
pub const IO_TIMEOUT: Duration = Duration::from_millis(5000);

/// Reserved payload: a client sending exactly these bytes in the active
/// state is asking to disconnect, not to chat.
pub const QUIT_SENTINEL: &[u8] = b"__quit__";

/// Send one frame: length prefix followed by the payload bytes.
///
/// Zero-length payloads are valid frames (the prefix alone is sent).
pub async fn send_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin,
{
    send_frame_timeout(writer, payload, IO_TIMEOUT).await
}

/// Receive one frame, returning the payload bytes.
///
/// No payload size limit is enforced beyond the 32-bit length field;
/// callers may impose their own.
pub async fn recv_frame<R>(reader: &mut R) -> Result<Vec<u8>, ChatError>
where
    R: AsyncRead + Unpin,
{
    recv_frame_timeout(reader, IO_TIMEOUT).await
}

pub(crate) async fn send_frame_timeout<W>(
    writer: &mut W,
    payload: &[u8],
    wait: Duration,
) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| ChatError::PayloadTooLarge)?;

    let transfer = async {
        writer.write_all(&len.to_be_bytes()).await?;
        if !payload.is_empty() {
            writer.write_all(payload).await?;
        }
        writer.flush().await
    };

    match timeout(wait, transfer).await {
        Err(_) => Err(ChatError::Timeout),
        Ok(Err(err)) => Err(classify_io(err)),
        Ok(Ok(())) => Ok(()),
    }
}

pub(crate) async fn recv_frame_timeout<R>(
    reader: &mut R,
    wait: Duration,
) -> Result<Vec<u8>, ChatError>
where
    R: AsyncRead + Unpin,
{
    let transfer = async {
        let mut prefix = [0u8; 4];
        reader.read_exact(&mut prefix).await?;
        let len = u32::from_be_bytes(prefix) as usize;
        let mut payload = vec![0u8; len];
        if len > 0 {
            reader.read_exact(&mut payload).await?;
        }
        Ok::<_, std::io::Error>(payload)
    };

    match timeout(wait, transfer).await {
        Err(_) => Err(ChatError::Timeout),
        Ok(Err(err)) => Err(classify_io(err)),
        Ok(Ok(payload)) => Ok(payload),
    }
}

/// A zero-length read or write mid-frame means the peer is gone.
fn classify_io(err: std::io::Error) -> ChatError {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::WriteZero => ChatError::PeerClosed,
        _ => ChatError::Io(err),
    }
}
