use super::cipher_aead_aes_gcm::CipherAeadAesGcm;
use super::cipher_aes_cm::CipherAesCm;
use super::cipher_null::CipherNull;
use super::*;
use crate::error::Error;

const KEY: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];
const SALT: [u8; 12] = [
    0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xab,
];

const RTP_INDEX: PacketIndex = PacketIndex::Rtp {
    ssrc: 0xcafebabe,
    roc: 0,
    sequence_number: 0x1234,
};

#[test]
fn test_aes_cm_keystream_is_contiguous() -> Result<()> {
    let cipher = CipherAesCm::new(&KEY, &SALT)?;

    let whole = cipher.keystream(&RTP_INDEX).output(40);

    let mut stream = cipher.keystream(&RTP_INDEX);
    let mut pieces = stream.output(3);
    pieces.extend(stream.output(17));
    pieces.extend(stream.output(20));

    assert_eq!(whole, pieces, "keystream must not restart between calls");
    Ok(())
}

#[test]
fn test_aes_cm_round_trip() -> Result<()> {
    let cipher = CipherAesCm::new(&KEY, &SALT)?;
    let plaintext = [0xabu8; 33];

    let mut buf = plaintext;
    cipher.encrypt(&RTP_INDEX, &[], &mut buf, &mut [])?;
    assert_ne!(buf, plaintext);

    cipher.decrypt(&RTP_INDEX, &[], &mut buf, &[])?;
    assert_eq!(buf, plaintext);

    let rtcp = PacketIndex::Rtcp {
        ssrc: 0xcafebabe,
        srtcp_index: 1,
    };
    let mut rtcp_buf = plaintext;
    cipher.encrypt(&rtcp, &[], &mut rtcp_buf, &mut [])?;
    assert_ne!(rtcp_buf, buf, "rtcp keystream must differ from rtp keystream");
    Ok(())
}

#[test]
fn test_null_cipher_is_identity() -> Result<()> {
    let mut buf = [0x55u8; 8];
    CipherNull.encrypt(&RTP_INDEX, &[], &mut buf, &mut [])?;
    assert_eq!(buf, [0x55u8; 8]);
    assert!(!CipherNull.is_aead());
    Ok(())
}

#[test]
fn test_aead_rtp_initialization_vector() -> Result<()> {
    let cipher = CipherAeadAesGcm::<aes::Aes128>::new(&KEY, &SALT)?;

    let iv = cipher.initialization_vector(&RTP_INDEX);
    let mut expected = [0u8, 0, 0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 0, 0x12, 0x34];
    for (e, s) in expected.iter_mut().zip(&SALT) {
        *e ^= s;
    }
    assert_eq!(iv, expected);

    let iv = cipher.initialization_vector(&PacketIndex::Rtcp {
        ssrc: 0xcafebabe,
        srtcp_index: 0x8000_0001,
    });
    let mut expected = [0u8, 0, 0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 0, 0, 1];
    for (e, s) in expected.iter_mut().zip(&SALT) {
        *e ^= s;
    }
    assert_eq!(iv, expected, "the E flag must not leak into the IV");
    Ok(())
}

#[test]
fn test_aead_failed_tag_leaves_payload_untouched() -> Result<()> {
    let cipher = CipherAeadAesGcm::<aes::Aes128>::new(&KEY, &SALT)?;
    assert!(cipher.is_aead());

    let aad = [0x80u8, 0x0f, 0x12, 0x34];
    let mut payload = [0xabu8; 16];
    let mut tag = [0u8; 16];
    cipher.encrypt(&RTP_INDEX, &aad, &mut payload, &mut tag)?;

    let ciphertext = payload;
    tag[0] ^= 1;
    assert_eq!(
        cipher.decrypt(&RTP_INDEX, &aad, &mut payload, &tag),
        Err(Error::AuthFail)
    );
    assert_eq!(payload, ciphertext);

    tag[0] ^= 1;
    cipher.decrypt(&RTP_INDEX, &aad, &mut payload, &tag)?;
    assert_eq!(payload, [0xabu8; 16]);
    Ok(())
}
