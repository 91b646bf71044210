use std::env;

use tessera_core::{values, Backend, ConnectOptions, Database, Value};

pub fn setup_if_needed() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reads the connection URL from `var`, or returns `None` (and says so) when
/// it is unset so server-backed tests can be skipped.
pub fn database_url(var: &str) -> Option<String> {
    setup_if_needed();

    match env::var(var) {
        Ok(url) => Some(url),

        Err(_) => {
            log::warn!("{var} is not set; skipping");
            None
        }
    }
}

// Make a new connection
// Ensure [dotenvy] and [env_logger] have been setup
pub fn connect<O: ConnectOptions>(var: &str) -> anyhow::Result<Option<Database<O::Backend>>> {
    let Some(url) = database_url(var) else {
        return Ok(None);
    };

    Ok(Some(O::parse(&url)?.connect()?))
}

/// SQL that differs between the engines the shared fixture runs on.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub blob_type: &'static str,
    pub placeholder: fn(usize) -> String,
}

impl Dialect {
    pub const SQLITE: Self = Self {
        blob_type: "BLOB",
        placeholder: question_mark,
    };

    pub const MARIADB: Self = Self {
        blob_type: "BLOB",
        placeholder: question_mark,
    };

    pub const POSTGRES: Self = Self {
        blob_type: "BYTEA",
        placeholder: dollar_number,
    };

    /// `count` placeholders separated by commas.
    pub fn placeholders(&self, count: usize) -> String {
        (1..=count)
            .map(self.placeholder)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn question_mark(_: usize) -> String {
    String::from("?")
}

fn dollar_number(n: usize) -> String {
    format!("${n}")
}

/// The two users every scenario starts from, in insertion order.
pub const USERS: [(&str, &str); 2] = [("Alice", "alice@x.com"), ("Bob", "bob@x.com")];

/// Recreates `users(id, name, email, avatar)` and inserts [`USERS`] through a
/// prepared statement.
pub fn seed_users<B: Backend>(db: &mut Database<B>, dialect: Dialect) -> anyhow::Result<()> {
    db.try_silent_query("DROP TABLE IF EXISTS users")?;

    db.try_silent_query(&format!(
        "CREATE TABLE users (\
            id INTEGER PRIMARY KEY, \
            name VARCHAR(64) NOT NULL, \
            email VARCHAR(128) NOT NULL, \
            avatar {} NULL\
        )",
        dialect.blob_type
    ))?;

    db.prepare_stmt(
        "seed_user",
        &format!(
            "INSERT INTO users (id, name, email) VALUES ({})",
            dialect.placeholders(3)
        ),
    )?;

    for (id, (name, email)) in (1_i32..).zip(USERS) {
        db.execute_stmt("seed_user", values![id, name, email])?;
    }

    Ok(())
}

/// Sets the avatar of user `id` through a bound blob parameter.
pub fn set_avatar<B: Backend>(
    db: &mut Database<B>,
    dialect: Dialect,
    id: i32,
    avatar: &[u8],
) -> anyhow::Result<()> {
    let sql = format!(
        "UPDATE users SET avatar = {} WHERE id = {}",
        (dialect.placeholder)(1),
        (dialect.placeholder)(2)
    );

    db.prepare_stmt("set_avatar", &sql)?;
    db.execute_stmt("set_avatar", [Value::Blob(avatar.to_vec()), Value::Integer(id)])?;

    Ok(())
}
