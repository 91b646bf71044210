use tessera::mariadb::{MariaDb, MariaDbDatabaseError};
use tessera::{values, Database, DatabaseError, Error, MariaDbConnectOptions, Value};
use tessera_test::{seed_users, set_avatar, Dialect, USERS};

const URL: &str = "MARIADB_DATABASE_URL";

fn connect() -> anyhow::Result<Option<Database<MariaDb>>> {
    tessera_test::connect::<MariaDbConnectOptions>(URL)
}

#[test]
fn it_connects() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    let rows = db.query("SELECT 1 + 1 AS two")?;

    assert_eq!(rows[0].get::<i64, _>("two")?, 2);

    Ok(())
}

#[test]
fn it_reads_users_in_insertion_order() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::MARIADB)?;

    db.prepare_stmt("all_users", "SELECT name, email FROM users ORDER BY id;")?;
    let rows = db.execute_stmt("all_users", values![])?;

    assert_eq!(rows.len(), 2);

    for (row, (name, email)) in rows.iter().zip(USERS) {
        assert_eq!(row["name"], Value::Text(name.into()));
        assert_eq!(row["email"], Value::Text(email.into()));
    }

    let rows = db.query("SELECT COUNT(*) FROM users")?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0].get::<i64, _>(0)?, 2);

    Ok(())
}

#[test]
fn it_round_trips_blobs() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::MARIADB)?;

    let avatar = [0x00, 0x01, 0x02, 0xFF];
    set_avatar(&mut db, Dialect::MARIADB, 1, &avatar)?;

    // text protocol
    let rows = db.query("SELECT avatar FROM users ORDER BY id")?;
    assert_eq!(rows[0]["avatar"], Value::Blob(avatar.to_vec()));
    assert_eq!(rows[1]["avatar"], Value::Null);

    // binary protocol
    db.prepare_stmt("avatar", "SELECT avatar FROM users WHERE id = ?")?;
    let rows = db.execute_stmt("avatar", values![1])?;
    assert_eq!(rows[0].get::<Vec<u8>, _>("avatar")?, avatar);

    Ok(())
}

#[test]
fn it_binds_every_value_type() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    db.prepare_stmt("echo", "SELECT ? AS v")?;
    db.prepare_stmt("echo_unsigned", "SELECT CAST(? AS UNSIGNED) AS v")?;

    let rows = db.execute_stmt("echo", values![-7])?;
    assert_eq!(rows[0].get::<i64, _>("v")?, -7);

    let rows = db.execute_stmt("echo_unsigned", values![u64::MAX])?;
    assert_eq!(rows[0].get::<u64, _>("v")?, u64::MAX);

    let rows = db.execute_stmt("echo", values![0.5])?;
    assert_eq!(rows[0].get::<f64, _>("v")?, 0.5);

    let rows = db.execute_stmt("echo", values!["héllo"])?;
    assert_eq!(rows[0].get::<String, _>("v")?, "héllo");

    let rows = db.execute_stmt("echo", [Value::Null])?;
    assert_eq!(rows[0]["v"], Value::Null);

    Ok(())
}

#[test]
fn it_reports_server_errors_and_stays_usable() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    let err = db.prepare_stmt("broken", "SELEC 1").unwrap_err();
    let err = err.as_database_error().unwrap();

    assert_eq!(err.code().as_deref(), Some("42000"));
    assert_eq!(err.downcast_ref::<MariaDbDatabaseError>().number(), 1064);
    assert!(!db.has_stmt("broken"));

    assert!(matches!(
        db.query("SELECT * FROM no_such_table"),
        Err(Error::Database(_))
    ));

    assert_eq!(db.query("SELECT 1")?.len(), 1);

    Ok(())
}

#[test]
fn it_rejects_extra_arguments() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    db.prepare_stmt("one", "SELECT ? AS v")?;

    let err = db.execute_stmt("one", values![1, 2]).unwrap_err();
    let err = err.as_database_error().unwrap();

    assert_eq!(err.downcast_ref::<MariaDbDatabaseError>().number(), 2034);

    // nothing was sent; the statement still works
    let rows = db.execute_stmt("one", values![3])?;
    assert_eq!(rows[0].get::<i64, _>("v")?, 3);

    Ok(())
}

#[test]
fn it_commits_and_rolls_back() -> anyhow::Result<()> {
    let Some(mut db) = connect()? else {
        return Ok(());
    };

    seed_users(&mut db, Dialect::MARIADB)?;

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
