#[cfg(test)]
mod session_rtcp_test;

use bytes::Bytes;

use crate::context::{Context, Direction, SrtpEvent, SRTCP_INDEX_LEN};
use crate::error::{Error, Result};
use crate::header::{RtcpHeader, RtpHeader, RTCP_HEADER_LEN};
use crate::policy::{Policy, Ssrc, HMAC_SHA1_MAX_TAG_LEN, MAX_MKI_LEN};
use crate::stream::StreamList;

/// Largest trailer any policy can append to a packet.
pub const SRTP_MAX_TRAILER_LEN: usize = HMAC_SHA1_MAX_TAG_LEN + MAX_MKI_LEN + SRTCP_INDEX_LEN;

pub type EventHandler = Box<dyn Fn(&SrtpEvent) + Send>;

/// Session owns the streams of one SRTP session: concrete streams keyed by
/// SSRC plus an optional template that new SSRCs are bound to on first use.
///
/// A session is not internally synchronized; callers sharing one across
/// threads wrap it in a lock.
#[derive(Default)]
pub struct Session {
    streams: StreamList,
    template: Option<Context>,
    event_handler: Option<EventHandler>,
}

impl Session {
    /// Creates a session with a stream (or template) for each policy, in order.
    pub fn new(policies: Vec<Policy>) -> Result<Self> {
        let mut session = Session::default();
        for policy in &policies {
            session.add_stream(policy)?;
        }
        Ok(session)
    }

    pub fn set_event_handler(&mut self, handler: EventHandler) {
        self.event_handler = Some(handler);
    }

    /// Adds a stream for a specific SSRC, or installs the template for a
    /// wildcard policy. A session holds at most one template.
    pub fn add_stream(&mut self, policy: &Policy) -> Result<()> {
        let context = Context::new(policy)?;
        match policy.ssrc {
            Ssrc::Specific(_) => self.streams.insert(context),
            Ssrc::AnyInbound | Ssrc::AnyOutbound => {
                if self.template.is_some() {
                    return Err(Error::BadParam);
                }
                self.template = Some(context);
                Ok(())
            }
        }
    }

    pub fn remove_stream(&mut self, ssrc: u32) -> Result<()> {
        self.streams.remove(ssrc).map(|_| ()).ok_or(Error::NoCtx)
    }

    /// Replaces the keys of an existing stream, or of the template and every
    /// stream still using the template's keys. Rollover counters, replay
    /// windows and SRTCP indices are kept. Nothing changes if any part of the
    /// update fails.
    pub fn update(&mut self, policy: &Policy) -> Result<()> {
        policy.validate()?;

        match policy.ssrc {
            Ssrc::Specific(ssrc) => {
                let context = self.streams.get(ssrc).ok_or(Error::BadParam)?.rekey(policy)?;
                self.streams.replace(context);
            }
            Ssrc::AnyInbound | Ssrc::AnyOutbound => {
                let old_template = self.template.as_ref().ok_or(Error::BadParam)?;
                let mut template = old_template.rekey(policy)?;
                template.set_direction(if policy.ssrc == Ssrc::AnyOutbound {
                    Direction::Outbound
                } else {
                    Direction::Inbound
                });

                let rekeyed: Vec<Context> = self
                    .streams
                    .iter()
                    .filter(|stream| stream.shares_keys_with(old_template))
                    .map(|stream| stream.rekey_from_template(&template))
                    .collect();

                for context in rekeyed {
                    self.streams.replace(context);
                }
                self.template = Some(template);
            }
        }

        Ok(())
    }

    /// Concrete streams of the session.
    pub fn streams(&self) -> &StreamList {
        &self.streams
    }

    /// Calls `f` with every stream until it returns false. `f` may remove
    /// the stream it is visiting.
    pub fn for_each_stream<F>(&mut self, f: F)
    where
        F: FnMut(&mut StreamList, u32) -> bool,
    {
        self.streams.for_each(f);
    }

    pub fn retain_streams<F>(&mut self, f: F)
    where
        F: FnMut(&Context) -> bool,
    {
        self.streams.retain(f);
    }

    /// Returns the rollover counter of the stream.
    pub fn get_roc(&self, ssrc: u32) -> Result<u32> {
        self.streams.get(ssrc).map(Context::roc).ok_or(Error::BadParam)
    }

    /// Sets the rollover counter the stream uses for its next packet.
    pub fn set_roc(&mut self, ssrc: u32, roc: u32) -> Result<()> {
        let context = self.streams.get_mut(ssrc).ok_or(Error::BadParam)?;
        context.set_roc(roc);
        Ok(())
    }

    /// Bytes protect_rtp appends with `mki_index`: the largest trailer over
    /// the template and every stream that has that key.
    pub fn protect_trailer_len(&self, mki_index: usize) -> Result<usize> {
        self.max_trailer_len(|context| context.rtp_trailer_len(mki_index))
    }

    pub fn protect_rtcp_trailer_len(&self, mki_index: usize) -> Result<usize> {
        self.max_trailer_len(|context| context.rtcp_trailer_len(mki_index))
    }

    fn max_trailer_len<F>(&self, trailer_len: F) -> Result<usize>
    where
        F: Fn(&Context) -> Option<usize>,
    {
        self.template
            .iter()
            .chain(self.streams.iter())
            .filter_map(trailer_len)
            .max()
            .ok_or(Error::BadParam)
    }

    /// Protects `input` into `output`, which must hold the packet plus its
    /// trailer. Returns the length written.
    pub fn protect_rtp(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        mki_index: usize,
    ) -> Result<usize> {
        let header = RtpHeader::parse(input)?;
        if output.len() < input.len() {
            return Err(Error::BufferSmall);
        }
        output[..input.len()].copy_from_slice(input);
        self.with_stream(header.ssrc, Direction::Outbound, |context, events| {
            context.protect_rtp(&header, output, input.len(), mki_index, events)
        })
    }

    /// Protects the packet in `buf[..len]`; the trailer is written after it.
    pub fn protect_rtp_in_place(
        &mut self,
        buf: &mut [u8],
        len: usize,
        mki_index: usize,
    ) -> Result<usize> {
        if len > buf.len() {
            return Err(Error::BadParam);
        }
        let header = RtpHeader::parse(&buf[..len])?;
        self.with_stream(header.ssrc, Direction::Outbound, |context, events| {
            context.protect_rtp(&header, buf, len, mki_index, events)
        })
    }

    /// Unprotects `input` into `output`, which must hold the packet without its
    /// trailer. Returns the plaintext length.
    pub fn unprotect_rtp(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let header = RtpHeader::parse(input)?;
        self.with_stream(header.ssrc, Direction::Inbound, |context, events| {
            let body_len = body_len(
                input.len(),
                header.header_len,
                context.rtp_unprotect_trailer_len(),
            )?;
            if output.len() < body_len {
                return Err(Error::BufferSmall);
            }
            let body = &mut output[..body_len];
            body.copy_from_slice(&input[..body_len]);
            context.unprotect_rtp(&header, body, &input[body_len..], events)
        })
    }

    pub fn unprotect_rtp_in_place(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        if len > buf.len() {
            return Err(Error::BadParam);
        }
        let header = RtpHeader::parse(&buf[..len])?;
        self.with_stream(header.ssrc, Direction::Inbound, |context, events| {
            let body_len =
                body_len(len, header.header_len, context.rtp_unprotect_trailer_len())?;
            let (body, trailer) = buf[..len].split_at_mut(body_len);
            context.unprotect_rtp(&header, body, trailer, events)
        })
    }

    pub fn protect_rtcp(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        mki_index: usize,
    ) -> Result<usize> {
        let header = RtcpHeader::parse(input)?;
        if output.len() < input.len() {
            return Err(Error::BufferSmall);
        }
        output[..input.len()].copy_from_slice(input);
        self.with_stream(header.ssrc, Direction::Outbound, |context, events| {
            context.protect_rtcp(&header, output, input.len(), mki_index, events)
        })
    }

    pub fn protect_rtcp_in_place(
        &mut self,
        buf: &mut [u8],
        len: usize,
        mki_index: usize,
    ) -> Result<usize> {
        if len > buf.len() {
            return Err(Error::BadParam);
        }
        let header = RtcpHeader::parse(&buf[..len])?;
        self.with_stream(header.ssrc, Direction::Outbound, |context, events| {
            context.protect_rtcp(&header, buf, len, mki_index, events)
        })
    }

    pub fn unprotect_rtcp(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let header = RtcpHeader::parse(input)?;
        self.with_stream(header.ssrc, Direction::Inbound, |context, events| {
            let body_len = body_len(
                input.len(),
                RTCP_HEADER_LEN,
                context.rtcp_unprotect_trailer_len(),
            )?;
            if output.len() < body_len {
                return Err(Error::BufferSmall);
            }
            let body = &mut output[..body_len];
            body.copy_from_slice(&input[..body_len]);
            context.unprotect_rtcp(&header, body, &input[body_len..], events)
        })
    }

    pub fn unprotect_rtcp_in_place(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        if len > buf.len() {
            return Err(Error::BadParam);
        }
        let header = RtcpHeader::parse(&buf[..len])?;
        self.with_stream(header.ssrc, Direction::Inbound, |context, events| {
            let body_len = body_len(
                len,
                RTCP_HEADER_LEN,
                context.rtcp_unprotect_trailer_len(),
            )?;
            let (body, trailer) = buf[..len].split_at_mut(body_len);
            context.unprotect_rtcp(&header, body, trailer, events)
        })
    }

    /// EncryptRTP protects a RTP packet with the first master key.
    pub fn encrypt_rtp(&mut self, plaintext: &[u8]) -> Result<Bytes> {
        let mut buf = vec![0u8; plaintext.len() + SRTP_MAX_TRAILER_LEN];
        let n = self.protect_rtp(plaintext, &mut buf, 0)?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    /// DecryptRTP verifies and decrypts a SRTP packet.
    pub fn decrypt_rtp(&mut self, encrypted: &[u8]) -> Result<Bytes> {
        let mut buf = encrypted.to_vec();
        let n = self.unprotect_rtp_in_place(&mut buf, encrypted.len())?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    pub fn encrypt_rtcp(&mut self, plaintext: &[u8]) -> Result<Bytes> {
        let mut buf = vec![0u8; plaintext.len() + SRTP_MAX_TRAILER_LEN];
        let n = self.protect_rtcp(plaintext, &mut buf, 0)?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    pub fn decrypt_rtcp(&mut self, encrypted: &[u8]) -> Result<Bytes> {
        let mut buf = encrypted.to_vec();
        let n = self.unprotect_rtcp_in_place(&mut buf, encrypted.len())?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    /// Runs `f` on the stream bound to `ssrc`. Unknown SSRCs get a stream
    /// spawned from the template, which joins the session only if `f`
    /// succeeds. Events raised by `f` are dispatched afterwards.
    fn with_stream<F>(&mut self, ssrc: u32, direction: Direction, f: F) -> Result<usize>
    where
        F: FnOnce(&mut Context, &mut Vec<SrtpEvent>) -> Result<usize>,
    {
        let mut events = vec![];

        let result = if let Some(context) = self.streams.get_mut(ssrc) {
            f(context, &mut events)
        } else {
            let template = self.template.as_ref().ok_or(Error::NoCtx)?;
            let mut context = template.spawn(ssrc);
            if direction == Direction::Outbound {
                context.set_direction(Direction::Outbound);
            }
            let result = f(&mut context, &mut events);
            if result.is_ok() {
                log::trace!("srtp bound ssrc {} to the session template", ssrc);
                self.streams.insert(context)?;
            }
            result
        };

        if let Some(handler) = &self.event_handler {
            for event in &events {
                handler(event);
            }
        }

        result
    }
}

/// Length of a protected packet without its trailer, which must still cover
/// the header.
fn body_len(len: usize, header_len: usize, trailer_len: usize) -> Result<usize> {
    len.checked_sub(trailer_len)
        .filter(|body_len| *body_len >= header_len)
        .ok_or(Error::BadParam)
}
