use super::*;
use crate::cipher::PacketIndex;
use crate::header::*;

impl Context {
    /// Protects the RTP packet in `buf[..len]` and appends the trailer, so `buf`
    /// needs room for `len` plus the trailer length. Returns the protected length.
    pub(crate) fn protect_rtp(
        &mut self,
        header: &RtpHeader,
        buf: &mut [u8],
        len: usize,
        mki_index: usize,
        events: &mut Vec<SrtpEvent>,
    ) -> Result<usize> {
        self.observe_direction(Direction::Outbound, events);

        let key_index = self.protect_keys(mki_index)?;
        let all_keys = Arc::clone(&self.keys);
        let keys = &all_keys[key_index];

        let tag_len = keys.rtp_tag_len();
        let out_len = len + tag_len + self.mki_size;
        if buf.len() < out_len {
            return Err(Error::BufferSmall);
        }

        let cryptex_profile = self.cryptex_protect_profile(header)?;
        self.check_key_limit(key_index, events)?;

        let (index, from_pending_roc) = self.srtp.estimate(header.sequence_number);
        let replay = self.srtp.check(index, from_pending_roc);
        let commit = if replay == ReplayCheck::Replay && self.allow_repeat_tx {
            false
        } else {
            replay.into_result().map_err(|err| {
                log::debug!(
                    "srtp refused to protect index {} on stream {}: {}",
                    index,
                    header.ssrc,
                    err
                );
                err
            })?;
            true
        };

        let roc = (index >> 16) as u32;
        let packet_index = PacketIndex::Rtp {
            ssrc: header.ssrc,
            roc,
            sequence_number: header.sequence_number,
        };

        let (packet, trailer) = buf[..out_len].split_at_mut(len);

        let enc_start = if let Some(profile) = cryptex_profile {
            set_extension_profile(packet, header, profile);
            cryptex_move_extension_header(packet, header);
            CRYPTEX_ENCRYPTION_START
        } else {
            self.process_header_extensions(keys, header, packet, &packet_index)?;
            header.header_len
        };

        let result = if keys.rtp_cipher.is_aead() {
            let (tag, mki) = trailer.split_at_mut(tag_len);
            mki.copy_from_slice(&keys.mki_id);
            let (aad, payload) = packet.split_at_mut(enc_start);
            keys.rtp_cipher.encrypt(&packet_index, aad, payload, tag)
        } else if self.rtp_services.confidentiality() {
            keys.rtp_cipher
                .encrypt(&packet_index, &[], &mut packet[enc_start..], &mut [])
        } else {
            Ok(())
        };

        if cryptex_profile.is_some() {
            cryptex_restore_extension_header(packet, header);
        }
        result?;

        if !keys.rtp_cipher.is_aead() {
            let (mki, tag) = trailer.split_at_mut(self.mki_size);
            mki.copy_from_slice(&keys.mki_id);
            keys.rtp_auth
                .generate_tag(&[&*packet, &roc.to_be_bytes()[..]], tag);
        }

        if commit {
            self.srtp.commit(index);
        }
        self.update_key_limit(key_index, events);

        Ok(out_len)
    }

    /// Unprotects the SRTP packet whose trailer (MKI and tag) was split off into
    /// `trailer`. `body` is authenticated and decrypted in place; on success its
    /// length is the plaintext length.
    pub(crate) fn unprotect_rtp(
        &mut self,
        header: &RtpHeader,
        body: &mut [u8],
        trailer: &[u8],
        events: &mut Vec<SrtpEvent>,
    ) -> Result<usize> {
        let all_keys = Arc::clone(&self.keys);
        let is_aead = all_keys[0].rtp_cipher.is_aead();
        let tag_len = all_keys[0].rtp_tag_len();
        if trailer.len() != tag_len + self.mki_size {
            return Err(Error::BadParam);
        }

        let (mki, tag) = if is_aead {
            let (tag, mki) = trailer.split_at(tag_len);
            (mki, tag)
        } else {
            trailer.split_at(self.mki_size)
        };
        let key_index = self.unprotect_keys(mki).map_err(|err| {
            log::debug!("srtp unknown mki on stream {}", header.ssrc);
            err
        })?;
        let keys = &all_keys[key_index];

        let cryptex = self.cryptex_unprotect_in_use(header)?;

        let (index, from_pending_roc) = self.srtp.estimate(header.sequence_number);
        self.srtp
            .check(index, from_pending_roc)
            .into_result()
            .map_err(|err| {
                log::debug!(
                    "srtp rejected index {} on stream {}: {}",
                    index,
                    header.ssrc,
                    err
                );
                err
            })?;
        self.check_key_limit(key_index, events)?;

        let roc = (index >> 16) as u32;
        let packet_index = PacketIndex::Rtp {
            ssrc: header.ssrc,
            roc,
            sequence_number: header.sequence_number,
        };

        if !is_aead && !keys.rtp_auth.verify_tag(&[&*body, &roc.to_be_bytes()[..]], tag) {
            log::debug!(
                "srtp failed to verify auth tag of index {} on stream {}",
                index,
                header.ssrc
            );
            return Err(Error::AuthFail);
        }

        let enc_start = if cryptex {
            cryptex_move_extension_header(body, header);
            CRYPTEX_ENCRYPTION_START
        } else {
            header.header_len
        };

        let result = if is_aead {
            let (aad, payload) = body.split_at_mut(enc_start);
            keys.rtp_cipher.decrypt(&packet_index, aad, payload, tag)
        } else if self.rtp_services.confidentiality() {
            keys.rtp_cipher
                .decrypt(&packet_index, &[], &mut body[enc_start..], &[])
        } else {
            Ok(())
        };

        if cryptex {
            cryptex_restore_extension_header(body, header);
        }
        result.map_err(|err| {
            log::debug!(
                "srtp failed to decrypt index {} on stream {}",
                index,
                header.ssrc
            );
            err
        })?;

        if cryptex {
            let profile = if header.extension_profile == EXTENSION_PROFILE_TWO_BYTE_CRYPTEX {
                EXTENSION_PROFILE_TWO_BYTE
            } else {
                EXTENSION_PROFILE_ONE_BYTE
            };
            set_extension_profile(body, header, profile);
        } else {
            self.process_header_extensions(keys, header, body, &packet_index)?;
        }

        self.srtp.commit(index);
        self.update_key_limit(key_index, events);
        self.observe_direction(Direction::Inbound, events);

        Ok(body.len())
    }

    /// Returns the cryptex profile to write when the packet is protected with
    /// RFC 9335, None when cryptex does not apply.
    fn cryptex_protect_profile(&self, header: &RtpHeader) -> Result<Option<u16>> {
        if !self.use_cryptex || !self.rtp_services.confidentiality() {
            return Ok(None);
        }
        if header.csrc_count > 0 && !header.extension {
            return Err(Error::CryptexErr);
        }
        if !header.extension {
            return Ok(None);
        }

        match header.extension_profile {
            EXTENSION_PROFILE_ONE_BYTE => Ok(Some(EXTENSION_PROFILE_ONE_BYTE_CRYPTEX)),
            EXTENSION_PROFILE_TWO_BYTE => Ok(Some(EXTENSION_PROFILE_TWO_BYTE_CRYPTEX)),
            _ => Err(Error::CryptexErr),
        }
    }

    fn cryptex_unprotect_in_use(&self, header: &RtpHeader) -> Result<bool> {
        if !self.use_cryptex || !self.rtp_services.confidentiality() {
            return Ok(false);
        }
        if header.csrc_count > 0 && !header.extension {
            return Err(Error::CryptexErr);
        }

        Ok(header.extension
            && (header.extension_profile == EXTENSION_PROFILE_ONE_BYTE_CRYPTEX
                || header.extension_profile == EXTENSION_PROFILE_TWO_BYTE_CRYPTEX))
    }

    /// RFC 6904: XORs the data of the configured extension elements with a
    /// keystream that advances over every element, configured or not.
    fn process_header_extensions(
        &self,
        keys: &DerivedKeys,
        header: &RtpHeader,
        packet: &mut [u8],
        packet_index: &PacketIndex,
    ) -> Result<()> {
        let (cipher, range) = match (&keys.rtp_xtn_hdr_cipher, header.extension_data_range()) {
            (Some(cipher), Some(range)) => (cipher, range),
            _ => return Ok(()),
        };
        let data = &mut packet[range];

        // Validate the whole block before touching it.
        walk_extension_elements(header.extension_profile, data, |_| {})?;

        let mut keystream = cipher.keystream(packet_index);
        walk_extension_elements(header.extension_profile, data, |element| {
            let mask = keystream.output(element.bytes.len());
            if self.enc_xtn_hdr.contains(&element.id) {
                for (byte, k) in element
                    .bytes
                    .iter_mut()
                    .zip(&mask)
                    .skip(element.prefix_len)
                {
                    *byte ^= k;
                }
            }
        })
    }
}
