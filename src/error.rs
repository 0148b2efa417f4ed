use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("unsupported parameter")]
    BadParam,
    #[error("output buffer is too small")]
    BufferSmall,
    #[error("couldn't allocate memory")]
    AllocFail,
    #[error("no appropriate context found")]
    NoCtx,
    #[error("replay check failed (bad index)")]
    ReplayFail,
    #[error("replay check failed (index too old)")]
    ReplayOld,
    #[error("authentication failure")]
    AuthFail,
    #[error("cryptex requires a header extension when CSRCs are present")]
    CryptexErr,
    #[error("algorithm failed test routine")]
    AlgoFail,
    #[error("can't use key any more")]
    KeyExpired,
    #[error("policy update is incompatible with the existing stream")]
    PolicyMismatch,
    #[error("unspecified failure")]
    Fail,

    #[error("SRTP master key material must be len {0}, got {1}")]
    SrtpMasterKeyLength(usize, usize),
    #[error("stream with ssrc {0} exists")]
    StreamWithSsrcExists(u32),
    #[error("no such SRTP protection profile {0:#06x}")]
    NoSuchSrtpProfile(u16),
    #[error("exporter called with wrong label")]
    ExporterWrongLabel,

    #[error("{0}")]
    Other(String),
}
