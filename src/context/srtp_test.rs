use lazy_static::lazy_static;

use super::*;
use crate::header::RtpHeader;

struct RtpTestCase {
    sequence_number: u16,
    encrypted: Vec<u8>,
}

const RTP_HEADER_LEN: usize = 12;
const RTP_TEST_CASE_DECRYPTED: [u8; 6] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05];

const MASTER_KEY: [u8; 16] = [
    0x0d, 0xcd, 0x21, 0x3e, 0x4c, 0xbc, 0xf2, 0x8f, 0x01, 0x7f, 0x69, 0x94, 0x40, 0x1e, 0x28, 0x89,
];
const MASTER_SALT: [u8; 14] = [
    0x62, 0x77, 0x60, 0x38, 0xc0, 0x6d, 0xc9, 0x41, 0x9f, 0x6d, 0xd9, 0x43, 0x3e, 0x7c,
];

lazy_static! {
    static ref RTP_TEST_CASES: Vec<RtpTestCase> = vec![
        RtpTestCase {
            sequence_number: 5000,
            encrypted: vec![
                0x6d, 0xd3, 0x7e, 0xd5, 0x99, 0xb7, 0x2d, 0x28, 0xb1, 0xf3, 0xa1, 0xf0, 0x0c, 0xfb,
                0xfd, 0x08,
            ],
        },
        RtpTestCase {
            sequence_number: 5001,
            encrypted: vec![
                0xda, 0x47, 0x0b, 0x2a, 0x74, 0x53, 0x65, 0xbd, 0x2f, 0xeb, 0xdc, 0x4b, 0x6d, 0x23,
                0xf3, 0xde,
            ],
        },
        RtpTestCase {
            sequence_number: 5002,
            encrypted: vec![
                0x6e, 0xa7, 0x69, 0x8d, 0x24, 0x6d, 0xdc, 0xbf, 0xec, 0x02, 0x1c, 0xd1, 0x60, 0x76,
                0xc1, 0x0e,
            ],
        },
        RtpTestCase {
            sequence_number: 5003,
            encrypted: vec![
                0x24, 0x7e, 0x96, 0xc8, 0x7d, 0x33, 0xa2, 0x92, 0x8d, 0x13, 0x8d, 0xe0, 0x76, 0x9f,
                0x08, 0xdc,
            ],
        },
        RtpTestCase {
            sequence_number: 5004,
            encrypted: vec![
                0x75, 0x43, 0x28, 0xe4, 0x3a, 0x77, 0x59, 0x9b, 0x2e, 0xdf, 0x7b, 0x12, 0x68, 0x0b,
                0x57, 0x49,
            ],
        },
        RtpTestCase {
            sequence_number: 65535, // upper boundary
            encrypted: vec![
                0xaf, 0xf7, 0xc2, 0x70, 0x37, 0x20, 0x83, 0x9c, 0x2c, 0x63, 0x85, 0x15, 0x0e, 0x44,
                0xca, 0x36,
            ],
        },
    ];
}

fn build_test_context(salt: &[u8]) -> Result<Context> {
    let key = [&MASTER_KEY[..], salt].concat();
    Context::new(&Policy::new(Ssrc::Specific(0), &key))
}

/// Header with every field zero except the sequence number.
fn decrypted_packet(sequence_number: u16) -> Vec<u8> {
    let mut packet = vec![0u8; RTP_HEADER_LEN];
    packet[2..4].copy_from_slice(&sequence_number.to_be_bytes());
    packet.extend_from_slice(&RTP_TEST_CASE_DECRYPTED);
    packet
}

fn encrypt(context: &mut Context, packet: &[u8]) -> Result<Vec<u8>> {
    let mut buf = packet.to_vec();
    buf.resize(packet.len() + 10, 0);
    let header = RtpHeader::parse(packet)?;
    let n = context.protect_rtp(&header, &mut buf, packet.len(), 0, &mut vec![])?;
    buf.truncate(n);
    Ok(buf)
}

fn decrypt(context: &mut Context, packet: &[u8]) -> Result<Vec<u8>> {
    let mut buf = packet.to_vec();
    let header = RtpHeader::parse(packet)?;
    let (body, trailer) = buf.split_at_mut(packet.len() - 10);
    let n = context.unprotect_rtp(&header, body, trailer, &mut vec![])?;
    buf.truncate(n);
    Ok(buf)
}

#[test]
fn test_rtp_invalid_auth() -> Result<()> {
    let mut encrypt_context = build_test_context(&MASTER_SALT)?;
    let mut invalid_context = build_test_context(&[0u8; 14])?;

    for test_case in RTP_TEST_CASES.iter() {
        let out = encrypt(&mut encrypt_context, &decrypted_packet(test_case.sequence_number))?;

        let result = decrypt(&mut invalid_context, &out);
        assert_eq!(
            result,
            Err(Error::AuthFail),
            "Managed to decrypt with incorrect salt for packet with SeqNum: {}",
            test_case.sequence_number
        );
    }

    Ok(())
}

#[test]
fn test_rtp_lifecycle() -> Result<()> {
    let mut encrypt_context = build_test_context(&MASTER_SALT)?;
    let mut decrypt_context = build_test_context(&MASTER_SALT)?;

    for test_case in RTP_TEST_CASES.iter() {
        let decrypted_raw = decrypted_packet(test_case.sequence_number);

        let actual_encrypted = encrypt(&mut encrypt_context, &decrypted_raw)?;
        assert_eq!(
            &actual_encrypted[RTP_HEADER_LEN..],
            &test_case.encrypted[..],
            "RTP packet with SeqNum invalid encryption: {}",
            test_case.sequence_number
        );
        assert_eq!(&actual_encrypted[..RTP_HEADER_LEN], &decrypted_raw[..RTP_HEADER_LEN]);

        let actual_decrypted = decrypt(&mut decrypt_context, &actual_encrypted)?;
        assert_eq!(
            actual_decrypted, decrypted_raw,
            "RTP packet with SeqNum invalid decryption: {}",
            test_case.sequence_number,
        );
    }

    assert_eq!(encrypt_context.roc(), 0);
    assert_eq!(decrypt_context.roc(), 0);

    Ok(())
}

#[test]
fn test_rtp_replayed_packet() -> Result<()> {
    let mut encrypt_context = build_test_context(&MASTER_SALT)?;
    let mut decrypt_context = build_test_context(&MASTER_SALT)?;

    let encrypted = encrypt(&mut encrypt_context, &decrypted_packet(5000))?;
    decrypt(&mut decrypt_context, &encrypted)?;
    assert_eq!(
        decrypt(&mut decrypt_context, &encrypted),
        Err(Error::ReplayFail)
    );

    assert_eq!(
        encrypt(&mut encrypt_context, &decrypted_packet(5000)),
        Err(Error::ReplayFail),
        "a sender does not reuse an index by default"
    );

    Ok(())
}

#[test]
fn test_rtp_allow_repeat_tx() -> Result<()> {
    let key = [&MASTER_KEY[..], &MASTER_SALT[..]].concat();
    let mut context = Context::new(&Policy {
        allow_repeat_tx: true,
        ..Policy::new(Ssrc::Specific(0), &key)
    })?;

    let first = encrypt(&mut context, &decrypted_packet(5000))?;
    let second = encrypt(&mut context, &decrypted_packet(5000))?;
    assert_eq!(first, second, "a repeated index produces the same packet");

    Ok(())
}

#[test]
fn test_rtp_tampered_packet() -> Result<()> {
    let mut encrypt_context = build_test_context(&MASTER_SALT)?;
    let mut decrypt_context = build_test_context(&MASTER_SALT)?;

    let mut encrypted = encrypt(&mut encrypt_context, &decrypted_packet(5000))?;
    encrypted[RTP_HEADER_LEN] ^= 0x01;
    assert_eq!(
        decrypt(&mut decrypt_context, &encrypted),
        Err(Error::AuthFail)
    );
    assert_eq!(
        decrypt_context.srtp.replay_detector.latest(),
        0,
        "a rejected packet leaves no state behind"
    );

    encrypted[RTP_HEADER_LEN] ^= 0x01;
    decrypt(&mut decrypt_context, &encrypted)?;

    Ok(())
}

#[test]
fn test_rtp_short_trailer() -> Result<()> {
    let mut context = build_test_context(&MASTER_SALT)?;
    let mut packet = decrypted_packet(1);
    let header = RtpHeader::parse(&packet)?;
    let (body, trailer) = packet.split_at_mut(RTP_HEADER_LEN + 2);

    assert_eq!(
        context.unprotect_rtp(&header, body, trailer, &mut vec![]),
        Err(Error::BadParam)
    );

    Ok(())
}
