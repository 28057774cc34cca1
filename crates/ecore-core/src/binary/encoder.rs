use std::rc::Rc;
use std::sync::Arc;

use ecore_pack::msgpack::{ExtensionRegistry, MsgPackEncoder};
use ecore_pack::PackValue;
use tracing::{debug, trace};

use super::tables::{factory_of, EncoderTables};
use super::{
    BinaryError, BinaryFeatureKind, EncodeOptions, END_MARKER, OBJECT_ID_MARKER, PROXY_MARKER,
    SIGNATURE, VERSION,
};
use crate::metamodel::{EClass, EDataType, EStructuralFeature};
use crate::object::{e_resource, EObjectRef};
use crate::resource::Resource;
use crate::Value;

/// Writes object graphs to the binary model format.
///
/// Dictionaries start empty on every call, so one encoder can write any
/// number of independent streams.
pub struct BinaryEncoder {
    options: EncodeOptions,
    extensions: Arc<ExtensionRegistry>,
    pack: MsgPackEncoder,
    tables: EncoderTables,
    /// Address of the resource being written; objects of other resources
    /// become proxies.
    resource: Option<usize>,
    depth: usize,
}

impl Default for BinaryEncoder {
    fn default() -> Self {
        Self::new(EncodeOptions::default())
    }
}

impl BinaryEncoder {
    pub fn new(options: EncodeOptions) -> Self {
        let extensions = ExtensionRegistry::global();
        Self {
            pack: MsgPackEncoder::with_capacity(options.initial_capacity, extensions.clone()),
            extensions,
            options,
            tables: EncoderTables::default(),
            resource: None,
            depth: 0,
        }
    }

    /// Uses `extensions` instead of the global registry for dates, ULIDs and UUIDs.
    pub fn with_extensions(mut self, extensions: Arc<ExtensionRegistry>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Writes the roots of `resource`.
    pub fn encode_resource(&mut self, resource: &Resource) -> Result<Vec<u8>, BinaryError> {
        self.reset(Some(resource));
        let roots = resource.contents();
        self.write_header();
        self.pack.write_uint(roots.len() as u64);
        for root in &roots {
            self.write_object(Some(root))?;
        }
        debug!(
            uri = resource.uri(),
            roots = roots.len(),
            objects = self.tables.object_count(),
            "encoded resource"
        );
        Ok(self.pack.writer.flush())
    }

    /// Writes `objects` as the roots of a stream outside any resource.
    pub fn encode_objects(&mut self, objects: &[EObjectRef]) -> Result<Vec<u8>, BinaryError> {
        self.reset(None);
        self.write_header();
        self.pack.write_uint(objects.len() as u64);
        for object in objects {
            self.write_object(Some(object))?;
        }
        Ok(self.pack.writer.flush())
    }

    /// Writes a single object with no root count.
    pub fn encode_object(&mut self, object: &EObjectRef) -> Result<Vec<u8>, BinaryError> {
        self.reset(None);
        self.write_header();
        self.write_object(Some(object))?;
        Ok(self.pack.writer.flush())
    }

    fn reset(&mut self, resource: Option<&Resource>) {
        self.pack =
            MsgPackEncoder::with_capacity(self.options.initial_capacity, self.extensions.clone());
        self.tables = EncoderTables::default();
        self.resource = resource.map(|r| r as *const Resource as usize);
        self.depth = 0;
    }

    fn write_header(&mut self) {
        self.pack.writer.buf(&SIGNATURE);
        self.pack.write_int(VERSION);
    }

    fn write_object(&mut self, object: Option<&EObjectRef>) -> Result<(), BinaryError> {
        let Some(object) = object else {
            self.pack.write_nil();
            return Ok(());
        };
        if let Some(id) = self.tables.object_id(object) {
            self.pack.write_uint(id as u64);
            return Ok(());
        }
        if self.depth >= self.options.max_depth {
            return Err(BinaryError::TooDeep(self.options.max_depth));
        }
        self.depth += 1;
        let result = self.write_object_body(object);
        self.depth -= 1;
        result
    }

    /// Writes an object on its first occurrence: ID, class, then features.
    fn write_object_body(&mut self, object: &EObjectRef) -> Result<(), BinaryError> {
        let id = self.tables.add_object(object);
        self.pack.write_uint(id as u64);
        let class = object.e_class();
        self.write_class(&class)?;

        if self.write_proxy(object) {
            return Ok(());
        }
        if self.options.write_object_ids {
            self.write_object_id(object);
        }
        for (feature_id, feature) in class.features().iter().enumerate() {
            if feature.is_transient() || feature.is_container() || !object.e_is_set(feature_id) {
                continue;
            }
            let (kind, first) = self.tables.feature(&class, feature_id, feature);
            self.pack.write_uint(feature_id as u64 + 1);
            if first {
                self.pack.write_str(feature.name());
            }
            let value = object.e_get(feature_id);
            self.write_value(&class, feature, kind, &value)?;
        }
        self.pack.write_int(END_MARKER);
        Ok(())
    }

    /// Writes the proxy form of `object` if it has one; `true` if written.
    #[inline(never)]
    fn write_proxy(&mut self, object: &EObjectRef) -> bool {
        let Some(uri) = self.proxy_uri(object) else {
            return false;
        };
        self.pack.write_int(PROXY_MARKER);
        self.pack.write_str(&uri);
        self.pack.write_int(END_MARKER);
        true
    }

    #[inline(never)]
    fn write_object_id(&mut self, object: &EObjectRef) {
        if let Some(object_id) = e_resource(object).and_then(|r| r.object_id(object)) {
            self.pack.write_int(OBJECT_ID_MARKER);
            self.pack.write_any(&object_id.to_pack());
        }
    }

    /// URI to write instead of the object's content: its own proxy URI, or
    /// its address when it lives in another resource.
    fn proxy_uri(&self, object: &EObjectRef) -> Option<String> {
        if let Some(uri) = object.e_proxy_uri() {
            return Some(uri);
        }
        let current = self.resource?;
        let resource = e_resource(object)?;
        if Rc::as_ptr(&resource) as usize == current {
            return None;
        }
        resource.object_uri(object)
    }

    #[inline(never)]
    fn write_class(&mut self, class: &Arc<EClass>) -> Result<(), BinaryError> {
        let package = class
            .package()
            .ok_or_else(|| BinaryError::UnknownPackage(format!("<package of {}>", class.name())))?;
        let (package_id, new_package) = self.tables.package_id(&package);
        self.pack.write_uint(package_id as u64);
        if new_package {
            self.pack.write_str(package.ns_uri());
            debug!(ns_uri = package.ns_uri(), id = package_id, "stream introduces package");
        }
        let (class_id, new_class) = self.tables.class_id(package_id, class);
        self.pack.write_uint(class_id as u64);
        if new_class {
            self.pack.write_str(class.name());
        }
        trace!(class = class.name(), "encode object");
        Ok(())
    }

    fn write_value(
        &mut self,
        class: &EClass,
        feature: &EStructuralFeature,
        kind: BinaryFeatureKind,
        value: &Value,
    ) -> Result<(), BinaryError> {
        let unencodable = || BinaryError::UnencodableValue {
            feature: feature.name().to_owned(),
            found: value.type_name(),
        };
        if kind.is_object() {
            return match value {
                Value::Null => self.write_object(None),
                Value::Object(object) => self.write_object(Some(object)),
                _ => Err(unencodable()),
            };
        }
        if kind.is_object_list() {
            let items = value.as_list().ok_or_else(unencodable)?;
            self.pack.write_uint(items.len() as u64);
            for item in items {
                match item {
                    Value::Object(object) => self.write_object(Some(object))?,
                    _ => return Err(unencodable()),
                }
            }
            return Ok(());
        }
        self.write_attribute(class, feature, kind, value)
    }

    #[inline(never)]
    fn write_attribute(
        &mut self,
        class: &EClass,
        feature: &EStructuralFeature,
        kind: BinaryFeatureKind,
        value: &Value,
    ) -> Result<(), BinaryError> {
        let unencodable = || BinaryError::UnencodableValue {
            feature: feature.name().to_owned(),
            found: value.type_name(),
        };
        let data_type = feature.data_type().ok_or_else(unencodable)?;
        match kind {
            BinaryFeatureKind::Data => self.write_data(class, data_type, value),
            BinaryFeatureKind::Enumerator => self.write_literal(feature, data_type, value),
            BinaryFeatureKind::DataList | BinaryFeatureKind::EnumeratorList => {
                let items = value.as_list().ok_or_else(unencodable)?;
                self.pack.write_uint(items.len() as u64);
                for item in items {
                    if kind == BinaryFeatureKind::DataList {
                        self.write_data(class, data_type, item)?;
                    } else {
                        self.write_literal(feature, data_type, item)?;
                    }
                }
                Ok(())
            }
            _ if self.write_native(kind, value) => Ok(()),
            _ => Err(unencodable()),
        }
    }

    /// Writes a value of a primitive kind; `false` if the value does not fit the kind.
    fn write_native(&mut self, kind: BinaryFeatureKind, value: &Value) -> bool {
        use BinaryFeatureKind as K;
        match (kind, value) {
            (_, Value::Null) => self.pack.write_nil(),
            (K::Boolean, Value::Bool(b)) => self.pack.write_bool(*b),
            (K::Byte | K::Short | K::Int | K::Long, Value::Int(i)) => self.pack.write_int(*i),
            (K::Char, Value::Char(c)) => self.pack.write_uint(u64::from(u32::from(*c))),
            (K::Float, Value::Float(x)) => self.pack.write_f32(*x as f32),
            (K::Double, Value::Float(x)) => self.pack.write_f64(*x),
            (K::String, Value::Str(s)) => self.pack.write_str(s),
            (K::ByteArray, Value::Bytes(bytes)) => self.pack.write_bin(bytes),
            (K::Date, Value::Date(date)) => self.pack.write_any(&PackValue::Date(*date)),
            _ => return false,
        }
        true
    }

    fn write_data(
        &mut self,
        class: &EClass,
        data_type: &EDataType,
        value: &Value,
    ) -> Result<(), BinaryError> {
        match factory_of(class).convert_to_string(data_type, value)? {
            Some(literal) => self.pack.write_str(&literal),
            None => self.pack.write_nil(),
        }
        Ok(())
    }

    fn write_literal(
        &mut self,
        feature: &EStructuralFeature,
        data_type: &Arc<EDataType>,
        value: &Value,
    ) -> Result<(), BinaryError> {
        let literal = match value {
            Value::Null => {
                self.pack.write_nil();
                return Ok(());
            }
            Value::Enum(literal) | Value::Str(literal) => literal,
            _ => {
                return Err(BinaryError::UnencodableValue {
                    feature: feature.name().to_owned(),
                    found: value.type_name(),
                })
            }
        };
        if data_type.literal_index(literal).is_none() {
            return Err(BinaryError::UnknownLiteral {
                data_type: data_type.name().to_owned(),
                literal: literal.clone(),
            });
        }
        let (id, first) = self.tables.literal_id(data_type, literal);
        self.pack.write_uint(id as u64);
        if first {
            self.pack.write_str(literal);
        }
        Ok(())
    }
}
