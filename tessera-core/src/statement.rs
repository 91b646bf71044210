use crate::error::Result;
use crate::rows::Rows;
use crate::value::Value;

/// A named, precompiled query owned by a [`Database`](crate::Database) registry.
///
/// Implementors stage parameters with [`bind`](Self::bind) and run the native
/// bind/execute/fetch sequence in [`do_execute`](Self::do_execute). Callers
/// go through [`execute`](Self::execute), which makes sure no binding from a
/// previous call leaks into the next one.
pub trait PreparedStatement {
    /// The name this statement was registered under.
    fn name(&self) -> &str;

    /// The SQL text this statement was prepared from.
    fn query(&self) -> &str;

    /// Stages `value` for the zero-based parameter position `index`.
    ///
    /// Nothing is sent to the database until [`do_execute`](Self::do_execute).
    fn bind(&mut self, index: usize, value: Value);

    /// Clears staged parameters and any native cursor state.
    fn reset(&mut self);

    /// Sends the staged parameters, executes the statement and fetches every
    /// row of the result.
    fn do_execute(&mut self) -> Result<Rows>;

    /// Binds `args` positionally and executes the statement.
    ///
    /// ```rust,ignore
    /// let rows = statement.execute(values![1, "Alice"])?;
    /// ```
    fn execute<I>(&mut self, args: I) -> Result<Rows>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
        Self: Sized,
    {
        self.reset();

        for (index, arg) in args.into_iter().enumerate() {
            self.bind(index, arg.into());
        }

        let result = self.do_execute();

        self.reset();

        result
    }
}
