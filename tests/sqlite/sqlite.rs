use tessera::sqlite::{Sqlite, SqliteConnectOptions, SqliteError};
use tessera::{values, ConnectOptions, Database, DatabaseError, Error, Value};
use tessera_test::{seed_users, set_avatar, setup_if_needed, Dialect, USERS};

fn new() -> anyhow::Result<Database<Sqlite>> {
    setup_if_needed();

    let mut db = Database::new(Sqlite::memory());
    db.try_connect()?;

    Ok(db)
}

fn new_with_users() -> anyhow::Result<Database<Sqlite>> {
    let mut db = new()?;
    seed_users(&mut db, Dialect::SQLITE)?;

    Ok(db)
}

#[test]
fn it_connects() -> anyhow::Result<()> {
    let mut db = new()?;

    let rows = db.query("SELECT 1 + 1 AS two")?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<i32, _>("two")?, 2);

    Ok(())
}

#[test]
fn it_reads_users_in_insertion_order() -> anyhow::Result<()> {
    let mut db = new()?;

    assert!(db.silent_query(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT);\
         INSERT INTO users (name, email) VALUES ('Alice', 'alice@x.com');\
         INSERT INTO users (name, email) VALUES ('Bob', 'bob@x.com');"
    ));

    db.prepare_stmt("all_users", "SELECT name, email FROM users;")?;
    let rows = db.execute_stmt("all_users", values![])?;

    assert_eq!(rows.len(), 2);

    for (row, (name, email)) in rows.iter().zip(USERS) {
        assert_eq!(row.names().collect::<Vec<_>>(), ["name", "email"]);
        assert_eq!(row[0], Value::Text(name.into()));
        assert_eq!(row[1], Value::Text(email.into()));
    }

    Ok(())
}

#[test]
fn it_counts_as_an_integer() -> anyhow::Result<()> {
    let mut db = new_with_users()?;

    let rows = db.query("SELECT COUNT(*) FROM users;")?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0][0], Value::Integer(2));

    Ok(())
}

#[test]
fn it_round_trips_blobs() -> anyhow::Result<()> {
    let mut db = new_with_users()?;

    let avatar = [0x00, 0x01, 0x02, 0xFF];
    set_avatar(&mut db, Dialect::SQLITE, 1, &avatar)?;

    let rows = db.query("SELECT avatar FROM users ORDER BY id")?;

    assert_eq!(rows[0].get::<Vec<u8>, _>("avatar")?, avatar);
    assert_eq!(rows[1]["avatar"], Value::Null);

    // a zero-length blob is not NULL
    set_avatar(&mut db, Dialect::SQLITE, 2, &[])?;

    let rows = db.query("SELECT avatar FROM users WHERE id = 2")?;
    assert_eq!(rows[0]["avatar"], Value::Blob(Vec::new()));

    Ok(())
}

#[test]
fn it_binds_every_value_type() -> anyhow::Result<()> {
    let mut db = new()?;

    db.prepare_stmt("echo", "SELECT ? AS v;")?;

    let cases = [
        (Value::Null, Value::Null),
        (Value::Integer(-7), Value::Integer(-7)),
        (Value::UnsignedInteger(7), Value::Integer(7)),
        (Value::LongInteger(9_000_000_000), Value::LongInteger(9_000_000_000)),
        (Value::Double(0.5), Value::Double(0.5)),
        (Value::Text("héllo".into()), Value::Text("héllo".into())),
        (Value::Boolean(true), Value::Integer(1)),
        (
            Value::UnsignedLongInteger(u64::MAX),
            Value::Text(u64::MAX.to_string()),
        ),
    ];

    for (bound, expected) in cases {
        let rows = db.execute_stmt("echo", [bound])?;
        assert_eq!(rows[0]["v"], expected);
    }

    Ok(())
}

#[test]
fn it_does_not_leak_bindings_between_executions() -> anyhow::Result<()> {
    let mut db = new()?;

    db.prepare_stmt("pair", "SELECT ? AS a, ? AS b;")?;

    let rows = db.execute_stmt("pair", values![1, "one"])?;
    assert_eq!(rows[0]["a"], Value::Integer(1));
    assert_eq!(rows[0]["b"], Value::Text("one".into()));

    let rows = db.execute_stmt("pair", values![2])?;
    assert_eq!(rows[0]["a"], Value::Integer(2));
    assert_eq!(rows[0]["b"], Value::Null);

    Ok(())
}

#[test]
fn it_replaces_statements_on_prepare() -> anyhow::Result<()> {
    let mut db = new_with_users()?;

    db.prepare_stmt("pick", "SELECT name FROM users WHERE id = 1")?;
    db.prepare_stmt("pick", "SELECT email FROM users WHERE id = 1")?;

    let rows = db.execute_stmt("pick", values![])?;

    assert_eq!(rows[0].get::<String, _>("email")?, "alice@x.com");

    Ok(())
}

#[test]
fn it_reports_prepare_errors_and_registers_nothing() -> anyhow::Result<()> {
    let mut db = new()?;

    let err = db.prepare_stmt("broken", "SELEC 1").unwrap_err();
    let err = err.as_database_error().unwrap();

    assert!(err.message().contains("syntax error"), "{}", err.message());
    assert!(err.try_downcast_ref::<SqliteError>().is_some());
    assert!(!db.has_stmt("broken"));

    assert!(matches!(
        db.execute_stmt("broken", values![]),
        Err(Error::UnknownStatement(name)) if name == "broken"
    ));

    Ok(())
}

#[test]
fn it_fails_cleanly_after_disconnect() -> anyhow::Result<()> {
    let mut db = new_with_users()?;

    db.prepare_stmt("all_users", "SELECT * FROM users")?;
    db.disconnect();

    assert!(!db.is_connected());
    assert!(matches!(db.query("SELECT 1"), Err(Error::NotConnected)));
    assert!(matches!(
        db.execute_stmt("all_users", values![]),
        Err(Error::NotConnected)
    ));
    assert!(!db.silent_query("SELECT 1"));

    // and can connect again
    db.try_connect()?;
    assert_eq!(db.query("SELECT 1")?.len(), 1);

    Ok(())
}

#[test]
fn it_commits_and_rolls_back() -> anyhow::Result<()> {
    let mut db = new_with_users()?;

    assert!(db.begin_transaction());
    assert!(db.silent_query("DELETE FROM users WHERE id = 2"));
    assert!(db.rollback_transaction());

    assert_eq!(db.query("SELECT id FROM users")?.len(), 2);

    assert!(db.begin_exclusive_transaction());
    assert!(db.silent_query("DELETE FROM users WHERE id = 2"));
    assert!(db.commit_transaction());

    assert_eq!(db.query("SELECT id FROM users")?.len(), 1);

    // nothing to commit
    assert!(!db.commit_transaction());

    Ok(())
}

#[test]
fn it_persists_to_a_file() -> anyhow::Result<()> {
    setup_if_needed();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shop.db");

    {
        let mut db = Database::new(Sqlite::new(&path));
        db.try_connect()?;
        seed_users(&mut db, Dialect::SQLITE)?;
    }

    let url = format!("sqlite://{}", path.display());
    let mut db = SqliteConnectOptions::parse(&url)?.read_only(true).connect()?;

    assert_eq!(db.query("SELECT name FROM users")?.len(), 2);
    assert!(db.try_silent_query("DELETE FROM users").is_err());

    Ok(())
}

#[test]
fn it_enforces_foreign_keys_when_enabled() -> anyhow::Result<()> {
    let mut db = new()?;

    db.backend_mut().enable_foreign_keys()?;

    db.try_silent_query(
        "CREATE TABLE parents (id INTEGER PRIMARY KEY);\
         CREATE TABLE children (parent_id INTEGER REFERENCES parents (id));",
    )?;

    let err = db
        .try_silent_query("INSERT INTO children VALUES (42)")
        .unwrap_err();

    assert!(matches!(err, Error::Database(_)), "{err}");

    Ok(())
}
