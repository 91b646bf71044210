mod buf_mut;

pub use buf_mut::PgBufMutExt;
use std::fmt::{self, Display, Formatter};
use std::num::{NonZeroU32, Saturating};

pub(crate) use tessera_core::io::*;

/// Names a prepared statement on the server. The unnamed statement is
/// replaced by every `Parse` that targets it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct StatementId(Option<NonZeroU32>);

impl StatementId {
    pub const UNNAMED: Self = Self(None);

    pub const NAMED_START: Self = Self(Some(NonZeroU32::MIN));

    #[cfg(test)]
    pub const TEST_VAL: Self = Self(NonZeroU32::new(1234567890));

    const NAME_PREFIX: &'static str = "tessera_s_";

    /// The next named id, wrapping on overflow. The unnamed id stays unnamed.
    pub fn next(&self) -> Self {
        Self(self.0.map(|id| id.checked_add(1).unwrap_or(NonZeroU32::MIN)))
    }

    pub fn name_len(&self) -> Saturating<usize> {
        let mut len = Saturating(0);

        if let Some(id) = self.0 {
            len += Self::NAME_PREFIX.len();
            len += itoa::Buffer::new().format(id.get()).len();
        }

        // NUL terminator
        len += 1;

        len
    }

    pub fn write_name<E>(&self, mut write: impl FnMut(&str) -> Result<(), E>) -> Result<(), E> {
        if let Some(id) = self.0 {
            write(Self::NAME_PREFIX)?;
            write(itoa::Buffer::new().format(id.get()))?;
        }

        write("\0")
    }
}

impl Display for StatementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{}{id}", Self::NAME_PREFIX),
            None => f.write_str("<unnamed>"),
        }
    }
}
