use tessera::sqlite::Sqlite;
use tessera::{Database, Error, Value};
use tessera_test::setup_if_needed;

fn echo(value: impl Into<Value>) -> anyhow::Result<Value> {
    setup_if_needed();

    let mut db = Database::new(Sqlite::memory());
    db.try_connect()?;

    db.prepare_stmt("echo", "SELECT ? AS v")?;
    let rows = db.execute_stmt("echo", [value.into()])?;

    Ok(rows[0]["v"].clone())
}

/// Binds `$value`, reads it back as `$ty` and checks it survived unchanged.
macro_rules! test_value {
    ($name:ident<$ty:ty>($($value:expr),+ $(,)?)) => {
        paste::item! {
            #[test]
            fn [< test_value_ $name >] () -> anyhow::Result<()> {
                $(
                    let value: $ty = $value;
                    let read: $ty = echo(value.clone())?.get()?;

                    assert_eq!(read, value, "{}", stringify!($value));
                )+

                Ok(())
            }
        }
    };
}

test_value!(i8<i8>(i8::MIN, -1, 0, i8::MAX));
test_value!(i16<i16>(i16::MIN, 0, i16::MAX));
test_value!(i32<i32>(i32::MIN, 0, i32::MAX));
test_value!(i64<i64>(i64::MIN, -1, 0, 1 << 40, i64::MAX));
test_value!(u8<u8>(0, 1, u8::MAX));
test_value!(u16<u16>(0, u16::MAX));
test_value!(u32<u32>(0, u32::MAX));
test_value!(u64<u64>(0, 1 << 40, 9_223_372_036_854_775_807));
test_value!(f64<f64>(0.0, -1.5, 3.141_592_653_589_793, f64::MAX));
test_value!(f32<f32>(0.0, -0.25, 1.5));
test_value!(string<String>(String::new(), "hello".into(), "héllo wörld ✓".into()));
test_value!(blob<Vec<u8>>(vec![0x00, 0x01, 0x02, 0xFF], vec![0; 1024]));

#[test]
fn it_reads_null_as_none() -> anyhow::Result<()> {
    let value = echo(Value::Null)?;

    assert_eq!(value, Value::Null);
    assert_eq!(value.get::<Option<i64>>()?, None);
    assert_eq!(echo(5)?.get::<Option<i64>>()?, Some(5));

    Ok(())
}

#[test]
fn it_widens_small_integers_on_read() -> anyhow::Result<()> {
    // SQLite stores every integer as 64-bit; values that fit come back as `Integer`
    assert_eq!(echo(7_u8)?, Value::Integer(7));
    assert_eq!(echo(7_i64)?, Value::Integer(7));
    assert_eq!(echo(u32::MAX)?, Value::LongInteger(i64::from(u32::MAX)));

    Ok(())
}

#[test]
fn it_stores_booleans_as_integers() -> anyhow::Result<()> {
    assert_eq!(echo(true)?, Value::Integer(1));
    assert_eq!(echo(false)?, Value::Integer(0));

    // no boolean storage class to read back from
    assert!(matches!(echo(true)?.get::<bool>(), Err(Error::WrongValueType(_))));

    Ok(())
}

#[test]
fn it_rejects_lossy_reads() -> anyhow::Result<()> {
    assert!(matches!(
        echo(300)?.get::<u8>(),
        Err(Error::WrongValueType(_))
    ));

    assert!(matches!(
        echo(-1)?.get::<u32>(),
        Err(Error::WrongValueType(_))
    ));

    assert!(matches!(
        echo(1.5)?.get::<i64>(),
        Err(Error::WrongValueType(_))
    ));

    assert!(matches!(
        echo("42")?.get::<i64>(),
        Err(Error::WrongValueType(_))
    ));

    assert!(matches!(
        echo(Value::Null)?.get::<String>(),
        Err(Error::WrongValueType(_))
    ));

    Ok(())
}

#[test]
fn it_stores_huge_unsigned_integers_as_text() -> anyhow::Result<()> {
    assert_eq!(
        echo(u64::MAX)?,
        Value::Text("18446744073709551615".to_owned())
    );

    Ok(())
}
