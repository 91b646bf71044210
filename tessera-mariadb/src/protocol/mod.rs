pub(crate) mod auth;
pub(crate) mod auth_plugin;
mod capabilities;
pub(crate) mod column_def;
pub(crate) mod column_flags;
pub(crate) mod field_type;
pub(crate) mod handshake;
pub(crate) mod handshake_response;
mod packet;
pub(crate) mod response;
pub(crate) mod row;
pub(crate) mod statement;
mod status;
pub(crate) mod text;

pub(crate) use capabilities::Capabilities;
pub(crate) use packet::{Packet, MAX_PAYLOAD_LEN};
