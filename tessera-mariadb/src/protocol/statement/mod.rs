//! Binary Protocol (prepared statements)
//!
//! <https://mariadb.com/kb/en/3-binary-protocol-prepared-statements/>

mod execute;
mod prepare;
mod prepare_ok;
mod stmt_close;

pub(crate) use execute::Execute;
pub(crate) use prepare::Prepare;
pub(crate) use prepare_ok::PrepareOk;
pub(crate) use stmt_close::StmtClose;
