use std::borrow::Cow;
use std::path::Path;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use crate::error::Error;
use crate::SqliteConnectOptions;

// https://www.sqlite.org/uri.html

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match &*value.to_ascii_lowercase() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),

        _ => Err(Error::ParseConnectOptions(
            format!("unknown value {value:?} for `{key}`").into(),
        )),
    }
}

impl FromStr for SqliteConnectOptions {
    type Err = Error;

    fn from_str(mut url: &str) -> Result<Self, Self::Err> {
        let mut options = Self::new();

        // remove scheme from the URL
        url = url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        let mut database_and_params = url.splitn(2, '?');

        let database = database_and_params.next().unwrap_or_default();

        if database == ":memory:" {
            options.in_memory = true;
        } else {
            // % decode to allow for `?` or `#` in the filename
            let decoded = percent_decode_str(database)
                .decode_utf8()
                .map_err(|err| Error::ParseConnectOptions(err.into()))?;

            options.in_memory = false;
            options.filename = Cow::Owned(Path::new(&*decoded).to_path_buf());
        }

        if let Some(params) = database_and_params.next() {
            for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
                match &*key {
                    // The mode query parameter determines if the new database is opened read-only,
                    // read-write, read-write and created if it does not exist, or that the
                    // database is a pure in-memory database that never interacts with disk,
                    // respectively.
                    "mode" => match &*value {
                        "ro" => {
                            options.read_only = true;
                        }

                        // default
                        "rw" => {
                            options.create_if_missing = false;
                        }

                        "rwc" => {
                            options.create_if_missing = true;
                        }

                        "memory" => {
                            options.in_memory = true;
                        }

                        _ => {
                            return Err(Error::ParseConnectOptions(
                                format!("unknown value {value:?} for `mode`").into(),
                            ));
                        }
                    },

                    "foreign_keys" => {
                        options.foreign_keys = parse_bool(&key, &value)?;
                    }

                    _ => {
                        return Err(Error::ParseConnectOptions(
                            format!("unknown query parameter `{key}` while parsing connection URL")
                                .into(),
                        ));
                    }
                }
            }
        }

        Ok(options)
    }
}

#[test]
fn test_parse_in_memory() -> Result<(), Error> {
    let options: SqliteConnectOptions = "sqlite::memory:".parse()?;
    assert!(options.in_memory);
    assert_eq!(options.get_filename(), Path::new(":memory:"));

    let options: SqliteConnectOptions = "sqlite://?mode=memory".parse()?;
    assert!(options.in_memory);

    Ok(())
}

#[test]
fn test_parse_read_only() -> Result<(), Error> {
    let options: SqliteConnectOptions = "sqlite://a.db?mode=ro".parse()?;
    assert!(options.read_only);
    assert_eq!(&*options.filename.to_string_lossy(), "a.db");

    Ok(())
}

#[test]
fn test_parse_create_and_foreign_keys() -> Result<(), Error> {
    let options: SqliteConnectOptions = "sqlite:shop.db?mode=rw&foreign_keys=on".parse()?;
    assert!(!options.create_if_missing);
    assert!(options.foreign_keys);
    assert!(!options.in_memory);

    let options: SqliteConnectOptions = "sqlite:///tmp/my%20data.db".parse()?;
    assert_eq!(options.get_filename(), Path::new("/tmp/my data.db"));

    Ok(())
}

#[test]
fn test_parse_rejects_unknown_parameters() {
    assert!(matches!(
        "sqlite:a.db?journal=wal".parse::<SqliteConnectOptions>(),
        Err(Error::ParseConnectOptions(_))
    ));

    assert!(matches!(
        "sqlite:a.db?foreign_keys=maybe".parse::<SqliteConnectOptions>(),
        Err(Error::ParseConnectOptions(_))
    ));
}
