use byteorder::{BigEndian, ByteOrder};

use super::*;
use crate::cipher::PacketIndex;
use crate::header::*;

const SRTCP_ENCRYPTED_FLAG: u32 = 1 << 31;

impl Context {
    /// Protects the compound RTCP packet in `buf[..len]`, appending the SRTCP
    /// index word, the MKI and the tag. Returns the protected length.
    pub(crate) fn protect_rtcp(
        &mut self,
        header: &RtcpHeader,
        buf: &mut [u8],
        len: usize,
        mki_index: usize,
        events: &mut Vec<SrtpEvent>,
    ) -> Result<usize> {
        self.observe_direction(Direction::Outbound, events);

        let key_index = self.protect_keys(mki_index)?;
        let all_keys = Arc::clone(&self.keys);
        let keys = &all_keys[key_index];

        let tag_len = keys.rtcp_tag_len();
        let out_len = len + tag_len + SRTCP_INDEX_LEN + self.mki_size;
        if buf.len() < out_len {
            return Err(Error::BufferSmall);
        }

        // The MSB of the index word is the E flag, so the index is exhausted early.
        if self.srtcp.srtcp_index >= MAX_SRTCP_INDEX {
            log::warn!("srtcp index exhausted on stream {}", header.ssrc);
            return Err(Error::KeyExpired);
        }
        let srtcp_index = self.srtcp.srtcp_index + 1;

        let encrypted = self.rtcp_services.confidentiality();
        let word = if encrypted {
            srtcp_index | SRTCP_ENCRYPTED_FLAG
        } else {
            srtcp_index
        };
        let packet_index = PacketIndex::Rtcp {
            ssrc: header.ssrc,
            srtcp_index,
        };

        let (packet, trailer) = buf[..out_len].split_at_mut(len);

        if keys.rtcp_cipher.is_aead() {
            let (tag, rest) = trailer.split_at_mut(tag_len);
            let (word_buf, mki) = rest.split_at_mut(SRTCP_INDEX_LEN);
            BigEndian::write_u32(word_buf, word);
            mki.copy_from_slice(&keys.mki_id);

            if encrypted {
                let (rtcp_header, payload) = packet.split_at_mut(RTCP_HEADER_LEN);
                let aad = [&*rtcp_header, &*word_buf].concat();
                keys.rtcp_cipher
                    .encrypt(&packet_index, &aad, payload, tag)?;
            } else {
                let aad = [&*packet, &*word_buf].concat();
                keys.rtcp_cipher
                    .encrypt(&packet_index, &aad, &mut [], tag)?;
            }
        } else {
            let (word_buf, rest) = trailer.split_at_mut(SRTCP_INDEX_LEN);
            let (mki, tag) = rest.split_at_mut(self.mki_size);

            if encrypted {
                keys.rtcp_cipher.encrypt(
                    &packet_index,
                    &[],
                    &mut packet[RTCP_HEADER_LEN..],
                    &mut [],
                )?;
            }

            BigEndian::write_u32(word_buf, word);
            mki.copy_from_slice(&keys.mki_id);
            keys.rtcp_auth.generate_tag(&[&*packet, &*word_buf], tag);
        }

        self.srtcp.srtcp_index = srtcp_index;

        Ok(out_len)
    }

    /// Unprotects the SRTCP packet whose trailer (index word, MKI and tag in
    /// wire order) was split off into `trailer`. Returns the plaintext length.
    pub(crate) fn unprotect_rtcp(
        &mut self,
        header: &RtcpHeader,
        body: &mut [u8],
        trailer: &[u8],
        events: &mut Vec<SrtpEvent>,
    ) -> Result<usize> {
        let all_keys = Arc::clone(&self.keys);
        let is_aead = all_keys[0].rtcp_cipher.is_aead();
        let tag_len = all_keys[0].rtcp_tag_len();
        if trailer.len() != tag_len + SRTCP_INDEX_LEN + self.mki_size {
            return Err(Error::BadParam);
        }

        let (word_buf, mki, tag) = if is_aead {
            let (tag, rest) = trailer.split_at(tag_len);
            let (word_buf, mki) = rest.split_at(SRTCP_INDEX_LEN);
            (word_buf, mki, tag)
        } else {
            let (word_buf, rest) = trailer.split_at(SRTCP_INDEX_LEN);
            let (mki, tag) = rest.split_at(self.mki_size);
            (word_buf, mki, tag)
        };
        let key_index = self.unprotect_keys(mki).map_err(|err| {
            log::debug!("srtcp unknown mki on stream {}", header.ssrc);
            err
        })?;
        let keys = &all_keys[key_index];

        let word = BigEndian::read_u32(word_buf);
        let encrypted = word & SRTCP_ENCRYPTED_FLAG != 0;
        let srtcp_index = word & MAX_SRTCP_INDEX;

        self.srtcp
            .replay_detector
            .check(u64::from(srtcp_index))
            .into_result()
            .map_err(|err| {
                log::debug!(
                    "srtcp rejected index {} on stream {}: {}",
                    srtcp_index,
                    header.ssrc,
                    err
                );
                err
            })?;

        let packet_index = PacketIndex::Rtcp {
            ssrc: header.ssrc,
            srtcp_index,
        };

        if is_aead {
            let result = if encrypted {
                let (rtcp_header, payload) = body.split_at_mut(RTCP_HEADER_LEN);
                let aad = [&*rtcp_header, word_buf].concat();
                keys.rtcp_cipher.decrypt(&packet_index, &aad, payload, tag)
            } else {
                let aad = [&*body, word_buf].concat();
                keys.rtcp_cipher.decrypt(&packet_index, &aad, &mut [], tag)
            };
            result.map_err(|err| {
                log::debug!(
                    "srtcp failed to decrypt index {} on stream {}",
                    srtcp_index,
                    header.ssrc
                );
                err
            })?;
        } else {
            if !keys.rtcp_auth.verify_tag(&[&*body, word_buf], tag) {
                log::debug!(
                    "srtcp failed to verify auth tag of index {} on stream {}",
                    srtcp_index,
                    header.ssrc
                );
                return Err(Error::AuthFail);
            }
            if encrypted != self.rtcp_services.confidentiality() {
                log::debug!(
                    "srtcp E flag of index {} disagrees with the policy of stream {}",
                    srtcp_index,
                    header.ssrc
                );
                return Err(Error::AuthFail);
            }
            if encrypted {
                keys.rtcp_cipher
                    .decrypt(&packet_index, &[], &mut body[RTCP_HEADER_LEN..], &[])?;
            }
        }

        self.srtcp.replay_detector.accept(u64::from(srtcp_index));
        self.observe_direction(Direction::Inbound, events);

        Ok(body.len())
    }
}
