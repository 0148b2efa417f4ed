#![warn(rust_2018_idioms)]
#![allow(dead_code)]

mod auth;
mod cipher;
pub mod config;
pub mod context;
pub mod error;
mod header;
mod key_derivation;
pub mod policy;
pub mod protection_profile;
mod replay_detector;
pub mod session;
pub mod stream;

pub use error::{Error, Result};
pub use policy::{CryptoPolicy, MasterKey, Policy, SecurityServices, Ssrc};
pub use session::Session;
