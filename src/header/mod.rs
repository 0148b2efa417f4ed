
use std::ops::Range;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

pub(crate) const RTP_HEADER_LEN: usize = 12;
pub(crate) const RTCP_HEADER_LEN: usize = 8;
pub(crate) const CSRC_LEN: usize = 4;
pub(crate) const EXTENSION_HEADER_LEN: usize = 4;

pub(crate) const EXTENSION_PROFILE_ONE_BYTE: u16 = 0xBEDE;
pub(crate) const EXTENSION_PROFILE_TWO_BYTE: u16 = 0x1000;
pub(crate) const EXTENSION_PROFILE_TWO_BYTE_MASK: u16 = 0xFFF0;
pub(crate) const EXTENSION_PROFILE_ONE_BYTE_CRYPTEX: u16 = 0xC0DE;
pub(crate) const EXTENSION_PROFILE_TWO_BYTE_CRYPTEX: u16 = 0xC2DE;

const ONE_BYTE_ID_RESERVED: u8 = 15;

/// Parsed view of the RTP fixed header, CSRC list and extension header.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      defined by profile       |           length              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        header extension                       |
/// |                             ....                              |
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RtpHeader {
    pub(crate) csrc_count: usize,
    pub(crate) extension: bool,
    pub(crate) sequence_number: u16,
    pub(crate) ssrc: u32,
    pub(crate) extension_profile: u16,
    /// Offset of the first byte after the header, where encryption starts.
    pub(crate) header_len: usize,
}

impl RtpHeader {
    /// Validates that `buf` holds a complete header. The version field is
    /// not checked.
    pub(crate) fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < RTP_HEADER_LEN {
            return Err(Error::BadParam);
        }

        let csrc_count = (buf[0] & 0x0F) as usize;
        let extension = (buf[0] >> 4) & 0x1 == 1;
        let sequence_number = BigEndian::read_u16(&buf[2..4]);
        let ssrc = BigEndian::read_u32(&buf[8..12]);

        let csrc_end = RTP_HEADER_LEN + csrc_count * CSRC_LEN;
        let mut header_len = csrc_end;
        let mut extension_profile = 0;
        if extension {
            header_len += EXTENSION_HEADER_LEN;
            if buf.len() < header_len {
                return Err(Error::BadParam);
            }
            extension_profile = BigEndian::read_u16(&buf[csrc_end..csrc_end + 2]);
            let extension_words = BigEndian::read_u16(&buf[csrc_end + 2..csrc_end + 4]) as usize;
            header_len += extension_words * 4;
        }
        if buf.len() < header_len {
            return Err(Error::BadParam);
        }

        Ok(RtpHeader {
            csrc_count,
            extension,
            sequence_number,
            ssrc,
            extension_profile,
            header_len,
        })
    }

    pub(crate) fn csrc_end(&self) -> usize {
        RTP_HEADER_LEN + self.csrc_count * CSRC_LEN
    }

    /// Range of the 4-byte extension header (profile and length).
    pub(crate) fn extension_header_range(&self) -> Option<Range<usize>> {
        if self.extension {
            let start = self.csrc_end();
            Some(start..start + EXTENSION_HEADER_LEN)
        } else {
            None
        }
    }

    /// Range of the extension elements following the extension header.
    pub(crate) fn extension_data_range(&self) -> Option<Range<usize>> {
        self.extension_header_range()
            .map(|range| range.end..self.header_len)
    }
}

/// The fixed part of the first RTCP packet in a compound packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RtcpHeader {
    pub(crate) ssrc: u32,
}

impl RtcpHeader {
    pub(crate) fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < RTCP_HEADER_LEN {
            return Err(Error::BadParam);
        }
        Ok(RtcpHeader {
            ssrc: BigEndian::read_u32(&buf[4..8]),
        })
    }
}

/// One element of an RFC 8285 header extension block.
pub(crate) struct ExtensionElement<'a> {
    pub(crate) id: u8,
    /// Size of the id/length prefix, 1 or 2.
    pub(crate) prefix_len: usize,
    /// Prefix followed by the element data.
    pub(crate) bytes: &'a mut [u8],
}

/// Walks the elements of a one-byte (0xBEDE) or two-byte (0x100X) extension
/// block in order. Zero padding between elements is skipped and a one-byte
/// element with id 15 ends the walk. Elements running past the block and any
/// other profile fail with [`Error::BadParam`].
pub(crate) fn walk_extension_elements<F>(profile: u16, data: &mut [u8], mut visit: F) -> Result<()>
where
    F: FnMut(ExtensionElement<'_>),
{
    let end = data.len();
    let mut pos = 0;

    if profile == EXTENSION_PROFILE_ONE_BYTE {
        while pos < end {
            let id = data[pos] >> 4;
            let len = (data[pos] & 0x0F) as usize + 1;
            if pos + 1 + len > end {
                return Err(Error::BadParam);
            }
            if id == ONE_BYTE_ID_RESERVED {
                break;
            }
            visit(ExtensionElement {
                id,
                prefix_len: 1,
                bytes: &mut data[pos..pos + 1 + len],
            });
            pos += 1 + len;
            while pos < end && data[pos] == 0 {
                pos += 1;
            }
        }
    } else if profile & EXTENSION_PROFILE_TWO_BYTE_MASK == EXTENSION_PROFILE_TWO_BYTE {
        while pos + 1 < end {
            let id = data[pos];
            let len = data[pos + 1] as usize;
            if pos + 2 + len > end {
                return Err(Error::BadParam);
            }
            visit(ExtensionElement {
                id,
                prefix_len: 2,
                bytes: &mut data[pos..pos + 2 + len],
            });
            pos += 2 + len;
            while pos < end && data[pos] == 0 {
                pos += 1;
            }
        }
    } else {
        return Err(Error::BadParam);
    }

    Ok(())
}

/// Moves the extension header in front of the CSRC list so that CSRCs,
/// extension elements and payload form one contiguous region after the
/// first 16 bytes (RFC 9335 section 5.1).
pub(crate) fn cryptex_move_extension_header(buf: &mut [u8], header: &RtpHeader) {
    if header.csrc_count > 0 {
        buf[RTP_HEADER_LEN..header.csrc_end() + EXTENSION_HEADER_LEN].rotate_right(EXTENSION_HEADER_LEN);
    }
}

/// Reverts [`cryptex_move_extension_header`].
pub(crate) fn cryptex_restore_extension_header(buf: &mut [u8], header: &RtpHeader) {
    if header.csrc_count > 0 {
        buf[RTP_HEADER_LEN..header.csrc_end() + EXTENSION_HEADER_LEN].rotate_left(EXTENSION_HEADER_LEN);
    }
}

/// Offset where the cryptex encrypted region starts, after the fixed header
/// and the (moved) extension header.
pub(crate) const CRYPTEX_ENCRYPTION_START: usize = RTP_HEADER_LEN + EXTENSION_HEADER_LEN;

pub(crate) fn set_extension_profile(buf: &mut [u8], header: &RtpHeader, profile: u16) {
    let start = header.csrc_end();
    BigEndian::write_u16(&mut buf[start..start + 2], profile);
}
