//! Native-messaging framing: a 32-bit native-endian length, then UTF-8 JSON.

use std::io::{self, Read, Write};

/// Largest frame accepted from the browser.
pub const MAX_INCOMING_FRAME: usize = 64 * 1024 * 1024;
/// Largest frame the browser accepts from a native host.
pub const MAX_OUTGOING_FRAME: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame io: {0}")]
    Io(#[from] io::Error),
    #[error("frame of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },
    #[error("stream ended inside a frame")]
    Truncated,
}

/// Reads one frame. Returns `Ok(None)` on EOF at a frame boundary.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(FrameError::Truncated),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_INCOMING_FRAME {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_INCOMING_FRAME,
        });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FrameError::Truncated,
        _ => FrameError::Io(e),
    })?;
    Ok(Some(body))
}

/// Writes one frame and flushes.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), FrameError> {
    if body.len() > MAX_OUTGOING_FRAME {
        return Err(FrameError::TooLarge {
            len: body.len(),
            max: MAX_OUTGOING_FRAME,
        });
    }
    writer.write_all(&(body.len() as u32).to_ne_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}
