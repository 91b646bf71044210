mod buf;
mod buf_mut;

pub use buf::MariaDbBufExt;
pub use buf_mut::MariaDbBufMutExt;

pub(crate) use tessera_core::io::*;
