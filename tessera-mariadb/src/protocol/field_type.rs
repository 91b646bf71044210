/// The wire type of a result column or statement parameter.
///
/// <https://mariadb.com/kb/en/result-set-packets/#field-types>
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FieldType(pub(crate) u8);

impl FieldType {
    pub(crate) const DECIMAL: FieldType = FieldType(0);
    pub(crate) const TINY: FieldType = FieldType(1);
    pub(crate) const SHORT: FieldType = FieldType(2);
    pub(crate) const LONG: FieldType = FieldType(3);
    pub(crate) const FLOAT: FieldType = FieldType(4);
    pub(crate) const DOUBLE: FieldType = FieldType(5);
    pub(crate) const NULL: FieldType = FieldType(6);
    pub(crate) const TIMESTAMP: FieldType = FieldType(7);
    pub(crate) const LONGLONG: FieldType = FieldType(8);
    pub(crate) const INT24: FieldType = FieldType(9);
    pub(crate) const DATE: FieldType = FieldType(10);
    pub(crate) const TIME: FieldType = FieldType(11);
    pub(crate) const DATETIME: FieldType = FieldType(12);
    pub(crate) const YEAR: FieldType = FieldType(13);
    pub(crate) const BIT: FieldType = FieldType(16);
    pub(crate) const NEWDECIMAL: FieldType = FieldType(246);
    pub(crate) const TINY_BLOB: FieldType = FieldType(249);
    pub(crate) const MEDIUM_BLOB: FieldType = FieldType(250);
    pub(crate) const LONG_BLOB: FieldType = FieldType(251);
    pub(crate) const BLOB: FieldType = FieldType(252);
    pub(crate) const VAR_STRING: FieldType = FieldType(253);
    pub(crate) const STRING: FieldType = FieldType(254);
    pub(crate) const GEOMETRY: FieldType = FieldType(255);

    /// Types whose payload is a length-prefixed byte string that may hold
    /// either characters or raw bytes, depending on the column charset.
    pub(crate) const fn is_blob_family(self) -> bool {
        matches!(
            self,
            FieldType::TINY_BLOB
                | FieldType::MEDIUM_BLOB
                | FieldType::LONG_BLOB
                | FieldType::BLOB
                | FieldType::STRING
                | FieldType::VAR_STRING
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TypeFlag {
    Signed,
    Unsigned,
}

impl TypeFlag {
    // the high bit of the second type byte marks unsigned parameters
    pub(crate) const fn to_byte(self) -> u8 {
        match self {
            TypeFlag::Signed => 0x00,
            TypeFlag::Unsigned => 0x80,
        }
    }
}
