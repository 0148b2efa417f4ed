use bytes::{BufMut, BytesMut};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use srtp_core::{session::SRTP_MAX_TRAILER_LEN, CryptoPolicy, Policy, Session, Ssrc};

const SSRC: u32 = 0xcafebabe;

fn master_key() -> Vec<u8> {
    vec![
        96, 180, 31, 4, 119, 137, 128, 252, 75, 194, 252, 44, 63, 56, 61, 55, 247, 26, 49, 94,
        99, 29, 79, 94, 5, 111, 252, 216, 62, 195,
    ]
}

fn gcm_master_key() -> Vec<u8> {
    vec![
        96, 180, 31, 4, 119, 137, 128, 252, 75, 194, 252, 44, 63, 56, 61, 55, 247, 26, 49, 94,
        99, 29, 79, 94, 5, 111, 252, 216,
    ]
}

fn gcm_policy(ssrc: Ssrc) -> Policy {
    Policy {
        rtp: CryptoPolicy::aes_gcm_128_16_auth(),
        rtcp: CryptoPolicy::aes_gcm_128_16_auth(),
        ..Policy::new(ssrc, &gcm_master_key())
    }
}

fn rtp_packet(seq: u16, payload: &[u8]) -> BytesMut {
    let mut pkt = BytesMut::with_capacity(12 + payload.len() + SRTP_MAX_TRAILER_LEN);
    pkt.put_u8(0x80);
    pkt.put_u8(0xe0);
    pkt.put_u16(seq);
    pkt.put_u32(seq as u32);
    pkt.put_u32(SSRC);
    pkt.extend_from_slice(payload);
    pkt
}

fn payload() -> Vec<u8> {
    (0..1200).map(|i| i as u8).collect()
}

fn benchmark_protect(c: &mut Criterion, name: &str, policy: Policy) {
    let mut session = Session::new(vec![policy]).unwrap();
    let pld = payload();

    c.bench_function(name, |b| {
        let mut seq = 1u16;
        b.iter_batched(
            || {
                let pkt = rtp_packet(seq, &pld);
                seq = seq.wrapping_add(1);
                pkt
            },
            |mut pkt| {
                let len = pkt.len();
                pkt.resize(len + SRTP_MAX_TRAILER_LEN, 0);
                session.protect_rtp_in_place(&mut pkt, len, 0).unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

fn benchmark_unprotect(c: &mut Criterion, name: &str, sender: Policy, receiver: Policy) {
    let mut sender = Session::new(vec![sender]).unwrap();
    let pld = payload();

    let packets: Vec<Vec<u8>> = (0..4096u16)
        .map(|seq| {
            let mut pkt = rtp_packet(seq, &pld);
            let len = pkt.len();
            pkt.resize(len + SRTP_MAX_TRAILER_LEN, 0);
            let n = sender.protect_rtp_in_place(&mut pkt, len, 0).unwrap();
            pkt.truncate(n);
            pkt.to_vec()
        })
        .collect();

    c.bench_function(name, |b| {
        let mut session = Session::new(vec![receiver.clone()]).unwrap();
        let mut next = 0usize;
        b.iter_batched(
            || {
                let index = next % packets.len();
                next += 1;
                (index, packets[index].clone())
            },
            |(index, mut pkt)| {
                // Start over with a fresh replay window once every packet was seen.
                if index == 0 {
                    session = Session::new(vec![receiver.clone()]).unwrap();
                }
                let len = pkt.len();
                session.unprotect_rtp_in_place(&mut pkt, len).unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

fn benchmark_aes_128_cm_hmac_sha1(c: &mut Criterion) {
    benchmark_protect(
        c,
        "protect AES_CM_128_HMAC_SHA1_80",
        Policy::new(Ssrc::Specific(SSRC), &master_key()),
    );
}

fn benchmark_aes_gcm_128(c: &mut Criterion) {
    benchmark_protect(c, "protect AEAD_AES_128_GCM", gcm_policy(Ssrc::Specific(SSRC)));
}

fn benchmark_unprotect_aes_128_cm_hmac_sha1(c: &mut Criterion) {
    benchmark_unprotect(
        c,
        "unprotect AES_CM_128_HMAC_SHA1_80",
        Policy::new(Ssrc::Specific(SSRC), &master_key()),
        Policy::new(Ssrc::AnyInbound, &master_key()),
    );
}

criterion_group!(
    benches,
    benchmark_aes_128_cm_hmac_sha1,
    benchmark_aes_gcm_128,
    benchmark_unprotect_aes_128_cm_hmac_sha1
);
criterion_main!(benches);
