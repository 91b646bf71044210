//! Generic Response Packets
//!
//! <https://mariadb.com/kb/en/4-server-response-packets/>

mod eof;
mod err;
mod ok;

pub(crate) use eof::EofPacket;
pub use err::ErrPacket;
pub(crate) use ok::OkPacket;
pub(crate) use super::status::Status;
