//! Domain name codec: length-prefixed labels, terminating zero byte, and
//! RFC 1035 §4.1.4 compression pointers on the read side.

use crate::error::WireError;

/// Maximum length of a presentation-format name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// Hard bound on the decoded length of a compressed name. Combined with the
/// pointer-follow budget this guarantees termination on hostile input.
const MAX_DECODED_LEN: usize = 256;

/// Pointer chains longer than this are treated as loops. A pointer that
/// leads only to more pointers makes no length progress, so the decoded
/// length bound alone cannot terminate it.
const MAX_POINTER_FOLLOWS: usize = 64;

/// Checks a presentation-format name against RFC 1035 limits.
///
/// The root name `"."` is valid; any other leading dot means an empty first
/// label and is rejected, as are empty interior labels (`".."`).
pub fn validate(name: &str) -> Result<(), WireError> {
    if name == "." {
        return Ok(());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(WireError::NameTooLong);
    }
    if name.starts_with('.') {
        return Err(WireError::EmptyLabel);
    }
    let mut labels = name.split('.').peekable();
    while let Some(label) = labels.next() {
        if label.is_empty() {
            // A single empty label at the very end is a trailing dot.
            if labels.peek().is_some() {
                return Err(WireError::EmptyLabel);
            }
        } else if label.len() > MAX_LABEL_LEN {
            return Err(WireError::LabelTooLong);
        }
    }
    Ok(())
}

/// Number of bytes `write_name` will emit for `name`: one length byte per
/// label plus the label bytes, plus the terminating zero byte.
pub fn encoded_len(name: &str) -> usize {
    if name == "." {
        1
    } else if name.ends_with('.') {
        name.len() + 1
    } else {
        name.len() + 2
    }
}

/// Appends `name` in wire format to `buf`. Fails if `validate` fails.
pub fn write_name(name: &str, buf: &mut Vec<u8>) -> Result<(), WireError> {
    validate(name)?;
    for label in name.split('.') {
        if label.is_empty() {
            break;
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    Ok(())
}

/// Decodes a possibly compressed name starting at `offset` within `msg`.
///
/// Returns the decoded name (no trailing dot; the root decodes to `""`) and
/// the position of the first byte after the name *as laid out at `offset`*:
/// once a compression pointer has been followed the returned cursor stays
/// just past that first pointer, no matter how far the chain jumps.
pub fn read_name(msg: &[u8], offset: usize) -> Result<(String, usize), WireError> {
    let mut name = String::new();
    let mut pos = offset;
    let mut resume_at = None;
    let mut follows = 0usize;

    loop {
        let len = *msg.get(pos).ok_or(WireError::Truncated)?;
        match len & 0xc0 {
            0x00 => {
                if len == 0 {
                    pos += 1;
                    break;
                }
                let end = pos + 1 + len as usize;
                let label = msg.get(pos + 1..end).ok_or(WireError::Truncated)?;
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(&String::from_utf8_lossy(label));
                if name.len() > MAX_DECODED_LEN {
                    return Err(WireError::NameTooLong);
                }
                pos = end;
            }
            0xc0 => {
                let low = *msg.get(pos + 1).ok_or(WireError::Truncated)?;
                let target = ((len & 0x3f) as usize) << 8 | low as usize;
                if target >= msg.len() {
                    return Err(WireError::BadPointer);
                }
                follows += 1;
                if follows > MAX_POINTER_FOLLOWS {
                    return Err(WireError::PointerLoop);
                }
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                pos = target;
            }
            // 0x40 and 0x80 label types are reserved and never valid here.
            _ => return Err(WireError::BadLabelType(len)),
        }
    }

    Ok((name, resume_at.unwrap_or(pos)))
}
