use std::fmt::{self, Display, Formatter};

use crate::error::{Error, Result};

/// The runtime type tag of a [`Value`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Integer,
    UnsignedInteger,
    LongInteger,
    UnsignedLongInteger,
    Double,
    Text,
    Blob,
    Boolean,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "Null",
            ValueType::Integer => "Integer",
            ValueType::UnsignedInteger => "UnsignedInteger",
            ValueType::LongInteger => "LongInteger",
            ValueType::UnsignedLongInteger => "UnsignedLongInteger",
            ValueType::Double => "Double",
            ValueType::Text => "Text",
            ValueType::Blob => "Blob",
            ValueType::Boolean => "Boolean",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell of a result set, or a single parameter of a prepared statement.
///
/// The variant always records the width and signedness the value was produced
/// with; an `i32` and an `i64` holding the same number are different values.
/// Reading a value back with [`Value::get`] allows lossless numeric conversions
/// between the integer and floating-point variants and rejects everything else.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i32),
    UnsignedInteger(u32),
    LongInteger(i64),
    UnsignedLongInteger(u64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Integer(_) => ValueType::Integer,
            Value::UnsignedInteger(_) => ValueType::UnsignedInteger,
            Value::LongInteger(_) => ValueType::LongInteger,
            Value::UnsignedLongInteger(_) => ValueType::UnsignedLongInteger,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
            Value::Blob(_) => ValueType::Blob,
            Value::Boolean(_) => ValueType::Boolean,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Reads this value as `T`.
    ///
    /// Integer and floating-point variants convert into any numeric `T` as long as
    /// the conversion is exact: no overflow, no sign loss, no fractional part and
    /// no NaN or infinity. Any other mismatch is an [`Error::WrongValueType`].
    ///
    /// ```rust
    /// # use tessera_core::Value;
    /// let value = Value::LongInteger(42);
    ///
    /// assert_eq!(value.get::<i32>()?, 42);
    /// assert_eq!(value.get::<f64>()?, 42.0);
    /// assert!(Value::Double(1.5).get::<i64>().is_err());
    /// # Ok::<(), tessera_core::Error>(())
    /// ```
    #[inline]
    pub fn get<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }

    /// Consumes this value and reads it as `T`, moving text and blob payloads out
    /// instead of copying them.
    #[inline]
    pub fn try_into_inner<T: FromValue>(self) -> Result<T> {
        T::from_owned_value(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    fn number(&self) -> Option<Number> {
        Some(match *self {
            Value::Integer(v) => Number::Integral(v.into()),
            Value::UnsignedInteger(v) => Number::Integral(v.into()),
            Value::LongInteger(v) => Number::Integral(v.into()),
            Value::UnsignedLongInteger(v) => Number::Integral(v.into()),
            Value::Double(v) => Number::Floating(v),

            _ => return None,
        })
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => Display::fmt(v, f),
            Value::UnsignedInteger(v) => Display::fmt(v, f),
            Value::LongInteger(v) => Display::fmt(v, f),
            Value::UnsignedLongInteger(v) => Display::fmt(v, f),
            Value::Double(v) => Display::fmt(v, f),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "x'{}'", hex::encode(v)),
            Value::Boolean(v) => Display::fmt(v, f),
        }
    }
}

// every integer variant fits in an i128 without loss, so it is the common
// intermediate for integral conversions regardless of sign
enum Number {
    Integral(i128),
    Floating(f64),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Lossy {
    Overflow,
    SignLoss,
    FractionalLoss,
    NonFinite,
}

impl Display for Lossy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lossy::Overflow => "overflow",
            Lossy::SignLoss => "sign loss",
            Lossy::FractionalLoss => "fractional part loss",
            Lossy::NonFinite => "non-finite value",
        })
    }
}

fn mismatch(value: &Value, target: &str) -> Error {
    Error::WrongValueType(format!(
        "cannot read {} value as {target}",
        value.value_type()
    ))
}

fn lossy(value: &Value, target: &str, reason: Lossy) -> Error {
    Error::WrongValueType(format!(
        "cannot convert {} {value} to {target}: {reason}",
        value.value_type()
    ))
}

fn float_to_integral(d: f64) -> std::result::Result<i128, Lossy> {
    if !d.is_finite() {
        return Err(Lossy::NonFinite);
    }

    if d.trunc() != d {
        return Err(Lossy::FractionalLoss);
    }

    // 2^127; i128 covers every integral target so anything at or past it overflows
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

    if !(-LIMIT..LIMIT).contains(&d) {
        return Err(Lossy::Overflow);
    }

    // the range and integrality checks above make this exact
    #[allow(clippy::cast_possible_truncation)]
    Ok(d as i128)
}

/// A type that can be read out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;

    #[inline]
    fn from_owned_value(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

macro_rules! impl_from_value_for_integral {
    (@check signed $wide:ident, $value:ident, $ty:ty) => {};

    (@check unsigned $wide:ident, $value:ident, $ty:ty) => {
        if $wide < 0 {
            return Err(lossy($value, stringify!($ty), Lossy::SignLoss));
        }
    };

    ($($sign:ident $ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let wide = match value.number() {
                        Some(Number::Integral(wide)) => wide,
                        Some(Number::Floating(d)) => float_to_integral(d)
                            .map_err(|reason| lossy(value, stringify!($ty), reason))?,

                        None => return Err(mismatch(value, stringify!($ty))),
                    };

                    impl_from_value_for_integral!(@check $sign wide, value, $ty);

                    <$ty>::try_from(wide).map_err(|_| lossy(value, stringify!($ty), Lossy::Overflow))
                }
            }
        )*
    };
}

impl_from_value_for_integral!(
    signed i8,
    signed i16,
    signed i32,
    signed i64,
    unsigned u8,
    unsigned u16,
    unsigned u32,
    unsigned u64,
);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value.number() {
            #[allow(clippy::cast_precision_loss)]
            Some(Number::Integral(wide)) => Ok(wide as f64),
            Some(Number::Floating(d)) => Ok(d),

            None => Err(mismatch(value, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value.number() {
            #[allow(clippy::cast_precision_loss)]
            Some(Number::Integral(wide)) => Ok(wide as f32),
            #[allow(clippy::cast_possible_truncation)]
            Some(Number::Floating(d)) => Ok(d as f32),

            None => Err(mismatch(value, "f32")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match *value {
            Value::Boolean(v) => Ok(v),

            _ => Err(mismatch(value, "bool")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v.clone()),

            _ => Err(mismatch(value, "String")),
        }
    }

    fn from_owned_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),

            _ => Err(mismatch(&value, "String")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v.clone()),

            _ => Err(mismatch(value, "Vec<u8>")),
        }
    }

    fn from_owned_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v),

            _ => Err(mismatch(&value, "Vec<u8>")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }

    fn from_owned_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn from_owned_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_owned_value(value).map(Some)
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_value_from!(
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    u8 => UnsignedInteger,
    u16 => UnsignedInteger,
    u32 => UnsignedInteger,
    i64 => LongInteger,
    u64 => UnsignedLongInteger,
    f32 => Double,
    f64 => Double,
    bool => Boolean,
    String => Text,
    &'_ str => Text,
    &'_ String => Text,
    Vec<u8> => Blob,
    &'_ [u8] => Blob,
);

impl From<()> for Value {
    #[inline]
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Builds a `Vec<Value>` from a list of expressions convertible into [`Value`].
///
/// ```rust
/// # use tessera_core::{values, Value};
/// let args = values![1, "two", 3.0, (), vec![0_u8, 1]];
///
/// assert_eq!(args[1], Value::Text("two".into()));
/// assert!(args[3].is_null());
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };

    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::{Value, ValueType};
    use crate::Error;

    macro_rules! test_conversion {
        ($($name:ident: $value:expr => $ty:ty = $expected:expr;)*) => {
            $(
                paste::paste! {
                    #[test]
                    fn [<it_converts_ $name>]() {
                        let value: Value = $value;
                        assert_eq!(value.get::<$ty>().unwrap(), $expected);
                    }
                }
            )*
        };
    }

    macro_rules! test_rejection {
        ($($name:ident: $value:expr => $ty:ty, $reason:literal;)*) => {
            $(
                paste::paste! {
                    #[test]
                    fn [<it_rejects_ $name>]() {
                        let value: Value = $value;

                        match value.get::<$ty>() {
                            Err(Error::WrongValueType(message)) => assert!(
                                message.contains($reason),
                                "expected {:?} in {:?}",
                                $reason,
                                message
                            ),

                            other => panic!("expected WrongValueType, got {:?}", other),
                        }
                    }
                }
            )*
        };
    }

    test_conversion! {
        integer_to_long: Value::Integer(-7) => i64 = -7;
        long_to_integer: Value::LongInteger(2) => i32 = 2;
        long_min_to_long: Value::LongInteger(i64::MIN) => i64 = i64::MIN;
        unsigned_long_max: Value::UnsignedLongInteger(u64::MAX) => u64 = u64::MAX;
        unsigned_to_signed: Value::UnsignedInteger(u32::MAX) => i64 = i64::from(u32::MAX);
        integer_to_byte: Value::Integer(255) => u8 = 255;
        integer_to_double: Value::Integer(7) => f64 = 7.0;
        long_to_double: Value::LongInteger(-9_007_199_254_740_993) => f64 = -9_007_199_254_740_992.0;
        whole_double_to_integer: Value::Double(2.0) => i32 = 2;
        negative_zero_to_unsigned: Value::Double(-0.0) => u32 = 0;
        large_whole_double_to_long: Value::Double(9.0e15) => i64 = 9_000_000_000_000_000;
        double_to_float: Value::Double(0.5) => f32 = 0.5;
        text: Value::Text("Alice".into()) => String = "Alice";
        blob: Value::Blob(vec![0x00, 0x01, 0x02, 0xFF]) => Vec<u8> = vec![0x00, 0x01, 0x02, 0xFF];
        boolean: Value::Boolean(true) => bool = true;
        null_to_option: Value::Null => Option<i32> = None;
        present_to_option: Value::Integer(3) => Option<i64> = Some(3);
    }

    test_rejection! {
        long_overflowing_integer: Value::LongInteger(5_000_000_000) => i32, "overflow";
        unsigned_long_overflowing_long: Value::UnsignedLongInteger(u64::MAX) => i64, "overflow";
        integer_overflowing_byte: Value::Integer(256) => u8, "overflow";
        negative_into_unsigned: Value::Integer(-1) => u32, "sign loss";
        negative_long_into_unsigned_long: Value::LongInteger(i64::MIN) => u64, "sign loss";
        negative_double_into_unsigned: Value::Double(-3.0) => u8, "sign loss";
        fractional_double: Value::Double(2.5) => i32, "fractional part loss";
        tiny_fraction: Value::Double(1.0e-300) => i64, "fractional part loss";
        nan: Value::Double(f64::NAN) => i64, "non-finite";
        infinity: Value::Double(f64::INFINITY) => u64, "non-finite";
        huge_double: Value::Double(1.0e20) => i64, "overflow";
        beyond_i128: Value::Double(1.0e300) => u64, "overflow";
        text_as_integer: Value::Text("2".into()) => i32, "cannot read Text value as i32";
        boolean_as_integer: Value::Boolean(true) => i32, "cannot read Boolean value";
        integer_as_boolean: Value::Integer(1) => bool, "cannot read Integer value as bool";
        blob_as_text: Value::Blob(vec![0x41]) => String, "cannot read Blob value";
        null_as_integer: Value::Null => i64, "cannot read Null value";
    }

    #[test]
    fn it_preserves_declared_width() {
        assert_eq!(Value::from(1_i32).value_type(), ValueType::Integer);
        assert_eq!(Value::from(1_i64).value_type(), ValueType::LongInteger);
        assert_eq!(Value::from(1_u32).value_type(), ValueType::UnsignedInteger);
        assert_eq!(Value::from(1_u64).value_type(), ValueType::UnsignedLongInteger);

        assert_ne!(Value::from(1_i32), Value::from(1_i64));
    }

    #[test]
    fn it_tracks_nulls() {
        assert!(Value::default().is_null());
        assert!(Value::from(()).is_null());
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
        assert_eq!(Value::Null.value_type(), ValueType::Null);
    }

    #[test]
    fn it_moves_payloads_out() -> anyhow::Result<()> {
        let text: String = Value::from("moved").try_into_inner()?;
        assert_eq!(text, "moved");

        let blob: Vec<u8> = Value::from(vec![1_u8, 2]).try_into_inner()?;
        assert_eq!(blob, [1, 2]);

        assert!(Value::from(1).try_into_inner::<String>().is_err());

        Ok(())
    }

    #[test]
    fn it_deep_copies_blobs() {
        let original = Value::Blob(vec![1, 2, 3]);
        let mut copy = original.clone();

        if let Value::Blob(bytes) = &mut copy {
            bytes[0] = 9;
        }

        assert_eq!(original.as_bytes(), Some(&[1_u8, 2, 3][..]));
        assert_eq!(copy.as_bytes(), Some(&[9_u8, 2, 3][..]));
    }

    #[test]
    fn it_builds_argument_lists() {
        let args = values![1, 2_u64, "three", 4.5, true, (), vec![0xFF_u8]];

        assert_eq!(
            args,
            vec![
                Value::Integer(1),
                Value::UnsignedLongInteger(2),
                Value::Text("three".into()),
                Value::Double(4.5),
                Value::Boolean(true),
                Value::Null,
                Value::Blob(vec![0xFF]),
            ]
        );

        assert!(values![].is_empty());
    }

    #[test]
    fn it_displays_values() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![0x00, 0xFF]).to_string(), "x'00ff'");
        assert_eq!(Value::Double(19.99).to_string(), "19.99");
    }
}
