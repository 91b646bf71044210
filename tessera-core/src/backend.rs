use crate::error::Result;
use crate::rows::Rows;
use crate::statement::PreparedStatement;

/// A database engine driven by [`Database`](crate::Database).
///
/// A backend owns exactly one native connection. `Database` calls the hooks
/// in a fixed order:
///
/// * connect: [`pre_connect`](Self::pre_connect), [`connect`](Self::connect),
///   [`post_connect`](Self::post_connect)
/// * disconnect: [`pre_disconnect`](Self::pre_disconnect),
///   [`disconnect`](Self::disconnect), [`post_disconnect`](Self::post_disconnect)
///
/// Every prepared statement is dropped before `disconnect` runs.
pub trait Backend: Sized + 'static {
    type Statement: PreparedStatement;

    /// Name of the engine, used in log output.
    const NAME: &'static str;

    fn pre_connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Opens the native connection.
    fn connect(&mut self) -> Result<()>;

    /// Runs after a successful [`connect`](Self::connect).
    fn post_connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_disconnect(&mut self) {}

    /// Closes the native connection. Must be a no-op when not connected.
    fn disconnect(&mut self);

    fn post_disconnect(&mut self) {}

    /// Prepares `sql` as a statement called `name`.
    fn prepare(&mut self, name: &str, sql: &str) -> Result<Self::Statement>;

    /// Prepares, executes and finalizes `sql` in one step, returning every row.
    fn query(&mut self, sql: &str) -> Result<Rows>;

    /// Executes `sql` and discards any result rows. May contain several
    /// statements where the engine allows it.
    fn silent_query(&mut self, sql: &str) -> Result<()>;

    fn begin_transaction_sql() -> &'static str {
        "BEGIN TRANSACTION;"
    }

    fn begin_exclusive_transaction_sql() -> &'static str {
        "BEGIN EXCLUSIVE TRANSACTION;"
    }

    fn commit_transaction_sql() -> &'static str {
        "COMMIT;"
    }

    fn rollback_transaction_sql() -> &'static str {
        "ROLLBACK;"
    }
}
