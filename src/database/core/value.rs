//! Untyped SQL values
//!
//! `SqlValue` is both the bound-parameter type handed to drivers and the
//! scalar type read back from single-value queries.

use serde::Serialize;
use std::fmt;

/// A single SQL value of any supported type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    /// Interpret the value as a boolean
    ///
    /// SQLite reports booleans as integers, so `0`/`1` are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Render the value as an SQL literal for log output
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql_literal())
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value, ValueRef};

        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<rusqlite::types::ValueRef<'_>> for SqlValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;

        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Int(i),
            ValueRef::Real(f) => SqlValue::Float(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::SqlValue;
    use postgres::types::{to_sql_checked, IsNull, ToSql, Type, WrongType};
    use std::error::Error;

    type BoxError = Box<dyn Error + Sync + Send>;

    impl ToSql for SqlValue {
        /// Encode the value for the parameter type the server asked for
        ///
        /// Integers widen to floating point columns; every other pairing that
        /// would change the meaning of the bytes is rejected.
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut postgres::types::private::BytesMut,
        ) -> Result<IsNull, BoxError> {
            match self {
                SqlValue::Null => Ok(IsNull::Yes),
                SqlValue::Bool(b) if <bool as ToSql>::accepts(ty) => b.to_sql(ty, out),
                SqlValue::Int(i) if *ty == Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                SqlValue::Int(i) if *ty == Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                SqlValue::Int(i) if *ty == Type::INT8 => i.to_sql(ty, out),
                SqlValue::Int(i) if *ty == Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                SqlValue::Int(i) if *ty == Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                SqlValue::Float(f) if *ty == Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                SqlValue::Float(f) if *ty == Type::FLOAT8 => f.to_sql(ty, out),
                SqlValue::Text(s) if <String as ToSql>::accepts(ty) => s.to_sql(ty, out),
                _ => Err(Box::new(WrongType::new::<SqlValue>(ty.clone()))),
            }
        }

        fn accepts(ty: &Type) -> bool {
            <bool as ToSql>::accepts(ty)
                || <i16 as ToSql>::accepts(ty)
                || <i32 as ToSql>::accepts(ty)
                || <i64 as ToSql>::accepts(ty)
                || <f32 as ToSql>::accepts(ty)
                || <f64 as ToSql>::accepts(ty)
                || <String as ToSql>::accepts(ty)
        }

        to_sql_checked!();
    }

    /// Read column `idx` of a row into an untyped value
    pub(crate) fn from_row(row: &postgres::Row, idx: usize) -> Result<SqlValue, postgres::Error> {
        let Some(column) = row.columns().get(idx) else {
            return Ok(SqlValue::Null);
        };
        let ty = column.type_();
        let value = if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Bool)
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(idx)?
                .map(|v| SqlValue::Int(v.into()))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(idx)?
                .map(|v| SqlValue::Int(v.into()))
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::Int)
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(idx)?
                .map(|v| SqlValue::Float(v.into()))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Float)
        } else {
            row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text)
        };
        Ok(value.unwrap_or(SqlValue::Null))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use postgres::types::private::BytesMut;

        fn encode(value: SqlValue, ty: &Type) -> Result<Vec<u8>, BoxError> {
            let mut buf = BytesMut::new();
            value.to_sql_checked(ty, &mut buf)?;
            Ok(buf.to_vec())
        }

        #[test]
        fn test_int_widens_to_float() {
            let bytes = encode(SqlValue::Int(1), &Type::FLOAT8).unwrap();
            assert_eq!(f64::from_be_bytes(bytes.try_into().unwrap()), 1.0);

            let bytes = encode(SqlValue::Int(3), &Type::FLOAT4).unwrap();
            assert_eq!(f32::from_be_bytes(bytes.try_into().unwrap()), 3.0);

            let bytes = encode(SqlValue::Float(2.5), &Type::FLOAT4).unwrap();
            assert_eq!(f32::from_be_bytes(bytes.try_into().unwrap()), 2.5);
        }

        #[test]
        fn test_int_narrows_to_column_width() {
            let bytes = encode(SqlValue::Int(7), &Type::INT4).unwrap();
            assert_eq!(i32::from_be_bytes(bytes.try_into().unwrap()), 7);

            let bytes = encode(SqlValue::Int(7), &Type::INT8).unwrap();
            assert_eq!(i64::from_be_bytes(bytes.try_into().unwrap()), 7);

            assert!(encode(SqlValue::Int(70_000), &Type::INT2).is_err());
        }

        #[test]
        fn test_mismatched_types_are_rejected() {
            assert!(encode(SqlValue::from("12"), &Type::INT8).is_err());
            assert!(encode(SqlValue::Bool(true), &Type::INT8).is_err());
            assert!(encode(SqlValue::Float(1.5), &Type::INT8).is_err());
            assert!(encode(SqlValue::Int(1), &Type::TEXT).is_err());
            assert!(encode(SqlValue::Int(1), &Type::BYTEA).is_err());
        }

        #[test]
        fn test_text_and_null_encode() {
            let bytes = encode(SqlValue::from("public"), &Type::TEXT).unwrap();
            assert_eq!(bytes, b"public");

            let mut buf = BytesMut::new();
            let is_null = SqlValue::Null.to_sql_checked(&Type::INT8, &mut buf).unwrap();
            assert!(matches!(is_null, IsNull::Yes));
            assert!(buf.is_empty());
        }
    }
}

#[cfg(feature = "postgres")]
pub(crate) use pg::from_row;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal() {
        assert_eq!(SqlValue::Null.to_sql_literal(), "NULL");
        assert_eq!(SqlValue::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(SqlValue::Int(42).to_sql_literal(), "42");
        assert_eq!(SqlValue::from("o'brien").to_sql_literal(), "'o''brien'");
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(SqlValue::Bool(false).as_bool(), Some(false));
        assert_eq!(SqlValue::Int(1).as_bool(), Some(true));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::from("t").as_bool(), None);
    }

    #[test]
    fn test_serialize_untagged() {
        let params = vec![SqlValue::from("public"), SqlValue::Int(3), SqlValue::Null];
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"["public",3,null]"#);
    }
}
