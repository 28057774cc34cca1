//! Data types: the value domains of attributes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::Value;

/// Native value shapes a data type can map onto.
///
/// Attributes whose data type has a native shape get a dedicated compact
/// binary encoding; everything else travels in string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    ByteArray,
    Date,
}

/// Instance-type names recognised as native shapes.
const NATIVE_TYPES: &[(&str, NativeType)] = &[
    ("bool", NativeType::Boolean),
    ("boolean", NativeType::Boolean),
    ("java.lang.Boolean", NativeType::Boolean),
    ("i8", NativeType::Byte),
    ("byte", NativeType::Byte),
    ("java.lang.Byte", NativeType::Byte),
    ("i16", NativeType::Short),
    ("short", NativeType::Short),
    ("java.lang.Short", NativeType::Short),
    ("i32", NativeType::Int),
    ("int", NativeType::Int),
    ("java.lang.Integer", NativeType::Int),
    ("i64", NativeType::Long),
    ("long", NativeType::Long),
    ("java.lang.Long", NativeType::Long),
    ("f32", NativeType::Float),
    ("float", NativeType::Float),
    ("java.lang.Float", NativeType::Float),
    ("f64", NativeType::Double),
    ("double", NativeType::Double),
    ("java.lang.Double", NativeType::Double),
    ("char", NativeType::Char),
    ("String", NativeType::String),
    ("string", NativeType::String),
    ("java.lang.String", NativeType::String),
    ("Vec<u8>", NativeType::ByteArray),
    ("byte[]", NativeType::ByteArray),
    ("DateTime<Utc>", NativeType::Date),
    ("Date", NativeType::Date),
    ("java.util.Date", NativeType::Date),
];

fn native_types() -> &'static HashMap<&'static str, NativeType> {
    static TABLE: OnceLock<HashMap<&'static str, NativeType>> = OnceLock::new();
    TABLE.get_or_init(|| NATIVE_TYPES.iter().copied().collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EDataType {
    name: String,
    instance_type_name: Option<String>,
    literals: Option<Vec<String>>,
}

impl EDataType {
    pub fn new(name: impl Into<String>, instance_type_name: Option<&str>) -> Self {
        Self {
            name: name.into(),
            instance_type_name: instance_type_name.map(str::to_owned),
            literals: None,
        }
    }

    /// An enumeration with the given literals, in declaration order.
    pub fn enumeration<I, S>(name: impl Into<String>, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            instance_type_name: None,
            literals: Some(literals.into_iter().map(Into::into).collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_type_name(&self) -> Option<&str> {
        self.instance_type_name.as_deref()
    }

    pub fn is_enum(&self) -> bool {
        self.literals.is_some()
    }

    pub fn literals(&self) -> &[String] {
        self.literals.as_deref().unwrap_or_default()
    }

    pub fn literal_index(&self, literal: &str) -> Option<usize> {
        self.literals().iter().position(|l| l == literal)
    }

    /// Native shape of this data type, looked up by its instance-type name.
    /// Enumerations never have one.
    pub fn native_type(&self) -> Option<NativeType> {
        if self.is_enum() {
            return None;
        }
        native_types().get(self.instance_type_name.as_deref()?).copied()
    }

    /// Value of an unset single-valued attribute of this type.
    pub fn default_value(&self) -> Value {
        if let Some(first) = self.literals.as_ref().and_then(|l| l.first()) {
            return Value::Enum(first.clone());
        }
        match self.native_type() {
            Some(NativeType::Boolean) => Value::Bool(false),
            Some(NativeType::Byte | NativeType::Short | NativeType::Int | NativeType::Long) => {
                Value::Int(0)
            }
            Some(NativeType::Float | NativeType::Double) => Value::Float(0.0),
            Some(NativeType::Char) => Value::Char('\0'),
            _ => Value::Null,
        }
    }
}

const ECORE_DATA_TYPES: &[(&str, &str)] = &[
    ("EString", "String"),
    ("EBoolean", "bool"),
    ("EByte", "i8"),
    ("EShort", "i16"),
    ("EInt", "i32"),
    ("ELong", "i64"),
    ("EFloat", "f32"),
    ("EDouble", "f64"),
    ("EChar", "char"),
    ("EByteArray", "Vec<u8>"),
    ("EDate", "DateTime<Utc>"),
];

/// The built-in Ecore data types, shared by every package.
pub fn ecore_data_types() -> &'static [Arc<EDataType>] {
    static TYPES: OnceLock<Vec<Arc<EDataType>>> = OnceLock::new();
    TYPES.get_or_init(|| {
        ECORE_DATA_TYPES
            .iter()
            .map(|(name, instance)| Arc::new(EDataType::new(*name, Some(instance))))
            .collect()
    })
}

pub fn ecore_data_type(name: &str) -> Option<Arc<EDataType>> {
    ecore_data_types().iter().find(|dt| dt.name() == name).cloned()
}
