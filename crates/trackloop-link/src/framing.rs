use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use trackloop_core::ProtocolError;

/// Upper bound on a single message payload. A 640x480 BGR frame is ~900 KiB;
/// a length beyond this means the framing is corrupt and resync is
/// impossible, so it is fatal.
pub(crate) const MAX_PAYLOAD: usize = 8 * 1024 * 1024;

/// Message kind on the wire. One tag byte, then a u32-be payload length,
/// then the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tag {
    Hello = 0x01,
    Welcome = 0x02,
    Frame = 0x03,
    Control = 0x04,
    Bye = 0x05,
}

impl Tag {
    fn from_byte(byte: u8) -> Option<Tag> {
        match byte {
            0x01 => Some(Tag::Hello),
            0x02 => Some(Tag::Welcome),
            0x03 => Some(Tag::Frame),
            0x04 => Some(Tag::Control),
            0x05 => Some(Tag::Bye),
            _ => None,
        }
    }
}

pub(crate) async fn write_message<W: AsyncWrite + Unpin>(
    io: &mut W,
    tag: Tag,
    payload: &[u8],
) -> Result<()> {
    io.write_all(&[tag as u8])
        .await
        .context("failed to write message tag")?;
    io.write_all(&(payload.len() as u32).to_be_bytes())
        .await
        .context("failed to write message length")?;
    io.write_all(payload)
        .await
        .context("failed to write message payload")?;
    io.flush().await.context("failed to flush message")?;
    Ok(())
}

/// Read one message. `Ok(None)` means the peer closed the stream cleanly
/// between messages.
pub(crate) async fn read_message<R: AsyncRead + Unpin>(
    io: &mut R,
) -> Result<Option<(Tag, Vec<u8>)>> {
    let mut tag_buf = [0u8; 1];
    match io.read_exact(&mut tag_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err).context("failed to read message tag"),
    }
    let tag = Tag::from_byte(tag_buf[0])
        .ok_or_else(|| anyhow!("unknown message tag {:#04x}", tag_buf[0]))?;

    let mut len_buf = [0u8; 4];
    io.read_exact(&mut len_buf)
        .await
        .context("failed to read message length")?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge {
            actual: len,
            limit: MAX_PAYLOAD,
        }
        .into());
    }

    let mut payload = vec![0u8; len];
    io.read_exact(&mut payload)
        .await
        .context("failed to read message payload")?;
    Ok(Some((tag, payload)))
}
