use tessera::postgres::PgDatabaseError;
use tessera::{values, Database, DatabaseError, Error, PgConnectOptions, Postgres, Value};
use tessera_test::{seed_users, set_avatar, Dialect, USERS};

const URL: &str = "POSTGRES_DATABASE_URL";

fn connect() -> anyhow::Result<Option<Database<Postgres>>> {
    tessera_test::connect::<PgConnectOptions>(URL)
}

#[test]
fn it_connects() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    let rows = db.query("SELECT 1 + 1 AS two")?;

    assert_eq!(rows[0]["two"], Value::Integer(2));
    assert!(db.backend().process_id().is_some());

    Ok(())
}

#[test]
fn it_reads_users_in_insertion_order() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::POSTGRES)?;

    db.prepare_stmt("all_users", "SELECT name, email FROM users ORDER BY id;")?;
    let rows = db.execute_stmt("all_users", values![])?;

    assert_eq!(rows.len(), 2);

    for (row, (name, email)) in rows.iter().zip(USERS) {
        assert_eq!(row.names().collect::<Vec<_>>(), ["name", "email"]);
        assert_eq!(row["name"], Value::Text(name.into()));
        assert_eq!(row["email"], Value::Text(email.into()));
    }

    // COUNT(*) is an INT8
    let rows = db.query("SELECT COUNT(*) FROM users")?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0][0], Value::Integer(2));

    Ok(())
}

#[test]
fn it_round_trips_blobs() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::POSTGRES)?;

    let avatar = [0x00, 0x01, 0x02, 0xFF];
    set_avatar(&mut db, Dialect::POSTGRES, 1, &avatar)?;

    let rows = db.query("SELECT avatar FROM users ORDER BY id")?;

    assert_eq!(rows[0].get::<Vec<u8>, _>("avatar")?, avatar);
    assert_eq!(rows[1]["avatar"], Value::Null);

    Ok(())
}

#[test]
fn it_binds_every_value_type() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    db.prepare_stmt(
        "echo",
        "SELECT $1::int4 AS i, $2::int8 AS l, $3::float8 AS d, $4::text AS t, $5::bool AS b",
    )?;

    let rows = db.execute_stmt(
        "echo",
        values![-7, 9_000_000_000_i64, 0.5, "héllo", true],
    )?;

    let row = &rows[0];

    assert_eq!(row["i"], Value::Integer(-7));
    assert_eq!(row["l"], Value::LongInteger(9_000_000_000));
    assert_eq!(row["d"], Value::Double(0.5));
    assert_eq!(row["t"], Value::Text("héllo".into()));
    assert_eq!(row["b"], Value::Boolean(true));

    // missing arguments are bound as NULL
    let rows = db.execute_stmt("echo", values![1])?;

    assert_eq!(rows[0]["i"], Value::Integer(1));
    assert_eq!(rows[0]["t"], Value::Null);

    let rows = db.query("SELECT 'Infinity'::float8 AS inf")?;
    assert_eq!(rows[0]["inf"], Value::Double(f64::INFINITY));

    Ok(())
}

#[test]
fn it_reports_server_errors_and_stays_usable() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    let err = db.prepare_stmt("broken", "SELEC 1").unwrap_err();
    let err = err.as_database_error().unwrap();

    assert_eq!(err.code().as_deref(), Some("42601"));
    assert!(err.try_downcast_ref::<PgDatabaseError>().is_some());
    assert!(!db.has_stmt("broken"));

    assert!(matches!(
        db.query("SELECT * FROM no_such_table"),
        Err(Error::Database(_))
    ));

    let err = db.prepare_stmt("empty", "  ;").unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|err| err.code()).as_deref(),
        Some("42601")
    );

    assert_eq!(db.query("SELECT 1")?.len(), 1);
    assert!(db.query("")?.is_empty());

    Ok(())
}

#[test]
fn it_commits_and_rolls_back() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::POSTGRES)?;

    assert!(db.begin_transaction());
    assert!(db.silent_query("DELETE FROM users WHERE id = 2"));
    assert!(db.rollback_transaction());

    assert_eq!(db.query("SELECT id FROM users")?.len(), 2);

    assert!(db.begin_exclusive_transaction());
    assert!(db.silent_query("DELETE FROM users WHERE id = 2"));
    assert!(db.commit_transaction());

    assert_eq!(db.query("SELECT id FROM users")?.len(), 1);

    Ok(())
}

#[test]
fn it_replaces_statements_on_prepare() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    db.prepare_stmt("pick", "SELECT 1 AS one")?;
    db.prepare_stmt("pick", "SELECT 2 AS two")?;

    let rows = db.execute_stmt("pick", values![])?;

    assert_eq!(rows[0].get::<i32, _>("two")?, 2);

    Ok(())
}

#[test]
fn it_fails_cleanly_after_disconnect() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    db.prepare_stmt("one", "SELECT 1")?;
    db.disconnect();

    assert!(matches!(db.query("SELECT 1"), Err(Error::NotConnected)));
    assert!(matches!(
        db.execute_stmt("one", values![]),
        Err(Error::NotConnected)
    ));

    db.try_connect()?;
    assert_eq!(db.query("SELECT 1")?.len(), 1);

    Ok(())
}
