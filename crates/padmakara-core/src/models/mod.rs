//! Data models for the media storage subsystem

mod grant;
mod retreat;
mod storage;
mod track;

pub use grant::*;
pub use retreat::*;
pub use storage::*;
pub use track::*;
