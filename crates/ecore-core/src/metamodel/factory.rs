use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};

use super::{ConversionError, EClass, EDataType, NativeType};
use crate::object::{DynamicEObject, EObjectRef};
use crate::Value;

/// Creates instances of a package's classes and converts data values to and
/// from their canonical string form.
pub trait EFactory: Send + Sync {
    fn create(&self, class: &Arc<EClass>) -> EObjectRef {
        DynamicEObject::new(class.clone())
    }

    fn create_from_string(&self, data_type: &EDataType, literal: &str)
        -> Result<Value, ConversionError>;

    /// Canonical string of `value`, or `None` for null.
    fn convert_to_string(
        &self,
        data_type: &EDataType,
        value: &Value,
    ) -> Result<Option<String>, ConversionError>;
}

/// Factory for packages without generated code: reflective objects, and
/// conversions driven by the data type's native shape.
///
/// Dates use RFC 3339, byte arrays standard base64. Data types without a
/// native shape keep their string form as the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicFactory;

fn parse_error(data_type: &EDataType, literal: &str, reason: impl ToString) -> ConversionError {
    ConversionError::Parse {
        data_type: data_type.name().to_owned(),
        literal: literal.to_owned(),
        reason: reason.to_string(),
    }
}

impl EFactory for DynamicFactory {
    fn create_from_string(
        &self,
        data_type: &EDataType,
        literal: &str,
    ) -> Result<Value, ConversionError> {
        if data_type.is_enum() {
            return match data_type.literal_index(literal) {
                Some(_) => Ok(Value::Enum(literal.to_owned())),
                None => Err(ConversionError::UnknownLiteral {
                    data_type: data_type.name().to_owned(),
                    literal: literal.to_owned(),
                }),
            };
        }
        let Some(native) = data_type.native_type() else {
            return Ok(Value::Str(literal.to_owned()));
        };
        let err = |reason: &dyn ToString| parse_error(data_type, literal, reason.to_string());
        Ok(match native {
            NativeType::Boolean => Value::Bool(literal.parse().map_err(|e| err(&e))?),
            NativeType::Byte => Value::Int(literal.parse::<i8>().map_err(|e| err(&e))? as i64),
            NativeType::Short => Value::Int(literal.parse::<i16>().map_err(|e| err(&e))? as i64),
            NativeType::Int => Value::Int(literal.parse::<i32>().map_err(|e| err(&e))? as i64),
            NativeType::Long => Value::Int(literal.parse::<i64>().map_err(|e| err(&e))?),
            NativeType::Float | NativeType::Double => {
                Value::Float(literal.parse::<f64>().map_err(|e| err(&e))?)
            }
            NativeType::Char => {
                let mut chars = literal.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(err(&"expected exactly one character")),
                }
            }
            NativeType::String => Value::Str(literal.to_owned()),
            NativeType::ByteArray => Value::Bytes(STANDARD.decode(literal).map_err(|e| err(&e))?),
            NativeType::Date => Value::Date(
                DateTime::parse_from_rfc3339(literal)
                    .map_err(|e| err(&e))?
                    .with_timezone(&Utc),
            ),
        })
    }

    fn convert_to_string(
        &self,
        data_type: &EDataType,
        value: &Value,
    ) -> Result<Option<String>, ConversionError> {
        let mismatch = || ConversionError::Mismatch {
            data_type: data_type.name().to_owned(),
            found: value.type_name(),
        };
        if data_type.is_enum() {
            return match value {
                Value::Null => Ok(None),
                Value::Enum(literal) | Value::Str(literal) => {
                    if data_type.literal_index(literal).is_none() {
                        return Err(ConversionError::UnknownLiteral {
                            data_type: data_type.name().to_owned(),
                            literal: literal.clone(),
                        });
                    }
                    Ok(Some(literal.clone()))
                }
                _ => Err(mismatch()),
            };
        }
        let text = match (data_type.native_type(), value) {
            (_, Value::Null) => return Ok(None),
            (Some(NativeType::Boolean) | None, Value::Bool(b)) => b.to_string(),
            (
                Some(NativeType::Byte | NativeType::Short | NativeType::Int | NativeType::Long)
                | None,
                Value::Int(i),
            ) => i.to_string(),
            (Some(NativeType::Float | NativeType::Double) | None, Value::Float(x)) => x.to_string(),
            (Some(NativeType::Float | NativeType::Double), Value::Int(i)) => i.to_string(),
            (Some(NativeType::Char) | None, Value::Char(c)) => c.to_string(),
            (Some(NativeType::String) | None, Value::Str(s)) => s.clone(),
            (Some(NativeType::ByteArray) | None, Value::Bytes(b)) => STANDARD.encode(b),
            (Some(NativeType::Date) | None, Value::Date(d)) => {
                d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            }
            _ => return Err(mismatch()),
        };
        Ok(Some(text))
    }
}
