//! Text Protocol
//!
//! <https://mariadb.com/kb/en/text-protocol/>

mod query;
mod quit;

pub(crate) use query::Query;
pub(crate) use quit::Quit;
