use std::sync::Arc;

use ecore_buffers::concat_list;
use ecore_pack::msgpack::{ExtensionRegistry, MsgPackDecoder};
use ecore_pack::PackValue;
use tracing::{debug, trace};

use super::tables::{arc_key, ClassData, DecoderTables, FeatureData, PackageData};
use super::{
    BinaryError, BinaryFeatureKind, DecodeOptions, END_MARKER, OBJECT_ID_MARKER, PROXY_MARKER,
    SIGNATURE, VERSION,
};
use crate::metamodel::{EDataType, EPackage, PackageRegistry};
use crate::object::EObjectRef;
use crate::resource::{ObjectId, Resource, ResourceSet};
use crate::Value;

/// Reads object graphs from the binary model format.
///
/// Packages named by a stream are looked up in the explicit registry, then
/// the resource set's packages, then the global registry.
pub struct BinaryDecoder<'a> {
    options: DecodeOptions,
    extensions: Arc<ExtensionRegistry>,
    resource_set: Option<&'a ResourceSet>,
    registry: Option<&'a PackageRegistry>,
    tables: DecoderTables,
    /// Object IDs read so far; handed to the target resource once the
    /// whole stream has decoded.
    ids: Vec<(EObjectRef, ObjectId)>,
    depth: usize,
}

impl<'a> BinaryDecoder<'a> {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            extensions: ExtensionRegistry::global(),
            resource_set: None,
            registry: None,
            tables: DecoderTables::default(),
            ids: Vec::new(),
            depth: 0,
        }
    }

    /// Resolves packages and, with `resolve_proxies`, proxy URIs through `resource_set`.
    pub fn with_resource_set(mut self, resource_set: &'a ResourceSet) -> Self {
        self.resource_set = Some(resource_set);
        self
    }

    pub fn with_registry(mut self, registry: &'a PackageRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_extensions(mut self, extensions: Arc<ExtensionRegistry>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Decodes the root objects of a stream. Object IDs in the stream are
    /// dropped, as there is no resource to hold them.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<Vec<EObjectRef>, BinaryError> {
        let roots = self.decode_roots(bytes)?;
        self.drop_ids();
        Ok(roots)
    }

    /// Like [`decode`](Self::decode), for a stream delivered in pieces.
    pub fn decode_chunks<T: AsRef<[u8]>>(
        &mut self,
        chunks: &[T],
    ) -> Result<Vec<EObjectRef>, BinaryError> {
        self.decode(&concat_list(chunks))
    }

    /// Replaces the contents of `resource` with the decoded roots and hands
    /// the stream's object IDs to its ID manager. On error the resource is
    /// left untouched.
    pub fn decode_resource(
        &mut self,
        resource: &Resource,
        bytes: &[u8],
    ) -> Result<(), BinaryError> {
        let roots = self.decode_roots(bytes)?;
        resource.clear();
        for root in &roots {
            resource.add(root.clone());
        }
        let ids = std::mem::take(&mut self.ids);
        if !resource.has_id_manager() {
            self.ids = ids;
            self.drop_ids();
        } else {
            resource.with_id_manager(|manager| {
                for (object, id) in ids {
                    manager.set_id(&object, id);
                }
            });
        }
        debug!(
            uri = resource.uri(),
            roots = roots.len(),
            objects = self.tables.objects.len(),
            "decoded resource"
        );
        Ok(())
    }

    /// Decodes a stream written by
    /// [`BinaryEncoder::encode_object`](super::BinaryEncoder::encode_object).
    pub fn decode_object(&mut self, bytes: &[u8]) -> Result<Option<EObjectRef>, BinaryError> {
        self.reset();
        let mut pack = MsgPackDecoder::with_registry(bytes, self.extensions.clone());
        read_header(&mut pack)?;
        let object = self.read_object(&mut pack)?;
        self.drop_ids();
        Ok(object)
    }

    fn reset(&mut self) {
        self.tables = DecoderTables::default();
        self.ids.clear();
        self.depth = 0;
    }

    fn drop_ids(&mut self) {
        for (_, id) in self.ids.drain(..) {
            debug!(%id, "no ID manager, dropping object ID");
        }
    }

    fn decode_roots(&mut self, bytes: &[u8]) -> Result<Vec<EObjectRef>, BinaryError> {
        self.reset();
        let mut pack = MsgPackDecoder::with_registry(bytes, self.extensions.clone());
        read_header(&mut pack)?;
        let count = read_index(&mut pack, "root count")?;
        let mut roots = Vec::with_capacity(count.min(pack.remaining()));
        for _ in 0..count {
            let root = self.read_object(&mut pack)?.ok_or(BinaryError::UnexpectedValue {
                expected: "root object",
                found: "nil",
            })?;
            roots.push(root);
        }
        Ok(roots)
    }

    /// Reads an object reference, decoding the object on its first occurrence.
    ///
    /// Recursive step of the decode. Locals larger than a handle belong in
    /// the `#[inline(never)]` helpers, not here or in `read_object_body`.
    fn read_object(
        &mut self,
        pack: &mut MsgPackDecoder,
    ) -> Result<Option<EObjectRef>, BinaryError> {
        let Some(id) = read_reference(pack, "object id")? else {
            return Ok(None);
        };
        if let Some(existing) = self.tables.objects.get(id) {
            return Ok(Some(existing.clone()));
        }
        let next = self.tables.objects.len();
        if id != next {
            return Err(BinaryError::InvalidObjectId {
                table: "object",
                id: id as i64,
                next,
            });
        }
        if self.depth >= self.options.max_depth {
            return Err(BinaryError::TooDeep(self.options.max_depth));
        }
        self.depth += 1;
        let result = self.read_object_body(pack, id);
        self.depth -= 1;
        result.map(Some)
    }

    fn read_object_body(
        &mut self,
        pack: &mut MsgPackDecoder,
        id: usize,
    ) -> Result<EObjectRef, BinaryError> {
        let (package_id, class_id) = self.read_class(pack)?;
        let object = self.create_object(id, package_id, class_id);
        let mut result = object.clone();
        loop {
            match read_int(pack, "feature marker")? {
                END_MARKER => break,
                OBJECT_ID_MARKER => self.read_object_id(pack, &object)?,
                PROXY_MARKER => {
                    if let Some(target) = self.read_proxy(pack, &object)? {
                        self.tables.objects[id] = target.clone();
                        result = target;
                    }
                }
                marker if marker > 0 => {
                    let wire_id = (marker - 1) as usize;
                    self.read_feature(pack, &object, package_id, class_id, wire_id)?;
                }
                marker => return Err(BinaryError::InvalidMarker(marker)),
            }
        }
        Ok(result)
    }

    /// Instantiates the object numbered `id` and enters it in the object table.
    #[inline(never)]
    fn create_object(&mut self, id: usize, package_id: usize, class_id: usize) -> EObjectRef {
        let class_data = &self.tables.packages[package_id].classes[class_id];
        let object = class_data.factory.create(&class_data.class);
        trace!(id, class = class_data.class.name(), "decode object");
        self.tables.objects.push(object.clone());
        object
    }

    #[inline(never)]
    fn read_object_id(
        &mut self,
        pack: &mut MsgPackDecoder,
        object: &EObjectRef,
    ) -> Result<(), BinaryError> {
        let raw = pack.read_scalar()?;
        let found = raw.type_name();
        let object_id = ObjectId::from_pack(raw).ok_or(BinaryError::UnexpectedValue {
            expected: "object identifier",
            found,
        })?;
        self.ids.push((object.clone(), object_id));
        Ok(())
    }

    /// Reads a proxy URI. Returns the target when it resolves, otherwise
    /// marks `object` as a proxy.
    #[inline(never)]
    fn read_proxy(
        &mut self,
        pack: &mut MsgPackDecoder,
        object: &EObjectRef,
    ) -> Result<Option<EObjectRef>, BinaryError> {
        let uri = read_str(pack)?;
        if self.options.resolve_proxies {
            if let Some(target) = self.resource_set.and_then(|rs| rs.get_eobject(&uri)) {
                return Ok(Some(target));
            }
            debug!(%uri, "proxy left unresolved");
        }
        object.e_set_proxy_uri(Some(uri));
        Ok(None)
    }

    fn read_feature(
        &mut self,
        pack: &mut MsgPackDecoder,
        object: &EObjectRef,
        package_id: usize,
        class_id: usize,
        wire_id: usize,
    ) -> Result<(), BinaryError> {
        let feature = self.feature_data(pack, package_id, class_id, wire_id)?;
        let value = self.read_value(pack, &feature)?;
        object.e_set(feature.feature_id, value)?;
        Ok(())
    }

    #[inline(never)]
    fn read_class(&mut self, pack: &mut MsgPackDecoder) -> Result<(usize, usize), BinaryError> {
        let package_id = read_index(pack, "package id")?;
        let next = self.tables.packages.len();
        if package_id == next {
            let ns_uri = read_str(pack)?;
            let package = self
                .lookup_package(&ns_uri)
                .ok_or_else(|| BinaryError::UnknownPackage(ns_uri.clone()))?;
            debug!(%ns_uri, id = package_id, "stream introduces package");
            self.tables.packages.push(PackageData::new(package));
        } else if package_id > next {
            return Err(BinaryError::InvalidObjectId {
                table: "package",
                id: package_id as i64,
                next,
            });
        }

        let class_id = read_index(pack, "class id")?;
        let package = &mut self.tables.packages[package_id];
        let next = package.classes.len();
        if class_id == next {
            let name = read_str(pack)?;
            let class = package.package.class(&name).cloned().ok_or_else(|| {
                BinaryError::UnknownClass {
                    package: package.package.ns_uri().to_owned(),
                    class: name.clone(),
                }
            })?;
            package.classes.push(ClassData::new(class));
        } else if class_id > next {
            return Err(BinaryError::InvalidObjectId {
                table: "class",
                id: class_id as i64,
                next,
            });
        }
        Ok((package_id, class_id))
    }

    fn lookup_package(&self, ns_uri: &str) -> Option<Arc<EPackage>> {
        if let Some(package) = self.registry.and_then(|r| r.get(ns_uri)) {
            return Some(package);
        }
        match self.resource_set {
            Some(resource_set) => resource_set.lookup_package(ns_uri),
            None => PackageRegistry::global().get(ns_uri),
        }
    }

    /// Feature introduced by the writer's `wire_id`, reading its name on first use.
    #[inline(never)]
    fn feature_data(
        &mut self,
        pack: &mut MsgPackDecoder,
        package_id: usize,
        class_id: usize,
        wire_id: usize,
    ) -> Result<FeatureData, BinaryError> {
        let class_data = &mut self.tables.packages[package_id].classes[class_id];
        if let Some(feature) = class_data.features.get(&wire_id) {
            return Ok(feature.clone());
        }
        let name = read_str(pack)?;
        let class = &class_data.class;
        let (feature_id, feature) = class
            .feature_id(&name)
            .and_then(|id| Some((id, class.feature(id)?.clone())))
            .ok_or_else(|| BinaryError::UnknownFeature {
                class: class.name().to_owned(),
                feature: name.clone(),
            })?;
        let data = FeatureData {
            feature_id,
            kind: BinaryFeatureKind::of(&feature),
            feature,
            factory: class_data.factory.clone(),
        };
        class_data.features.insert(wire_id, data.clone());
        Ok(data)
    }

    fn read_value(
        &mut self,
        pack: &mut MsgPackDecoder,
        feature: &FeatureData,
    ) -> Result<Value, BinaryError> {
        let kind = feature.kind;
        if kind.is_object() {
            return Ok(self.read_object(pack)?.map_or(Value::Null, Value::Object));
        }
        if kind.is_object_list() {
            let count = read_index(pack, "list length")?;
            let mut items = Vec::with_capacity(count.min(pack.remaining()));
            for _ in 0..count {
                let item = self.read_object(pack)?.ok_or(BinaryError::UnexpectedValue {
                    expected: "object",
                    found: "nil",
                })?;
                items.push(Value::Object(item));
            }
            return Ok(Value::List(items));
        }
        self.read_attribute(pack, feature)
    }

    #[inline(never)]
    fn read_attribute(
        &mut self,
        pack: &mut MsgPackDecoder,
        feature: &FeatureData,
    ) -> Result<Value, BinaryError> {
        let kind = feature.kind;
        let data_type = feature.feature.data_type().ok_or(BinaryError::UnexpectedValue {
            expected: "attribute",
            found: "reference",
        })?;
        match kind {
            BinaryFeatureKind::Data => read_data(pack, feature, data_type),
            BinaryFeatureKind::Enumerator => self.read_literal(pack, data_type),
            BinaryFeatureKind::DataList | BinaryFeatureKind::EnumeratorList => {
                let count = read_index(pack, "list length")?;
                let mut items = Vec::with_capacity(count.min(pack.remaining()));
                for _ in 0..count {
                    items.push(if kind == BinaryFeatureKind::DataList {
                        read_data(pack, feature, data_type)?
                    } else {
                        self.read_literal(pack, data_type)?
                    });
                }
                Ok(Value::List(items))
            }
            _ => read_native(pack, kind),
        }
    }

    fn read_literal(
        &mut self,
        pack: &mut MsgPackDecoder,
        data_type: &Arc<EDataType>,
    ) -> Result<Value, BinaryError> {
        let Some(id) = read_reference(pack, "literal id")? else {
            return Ok(Value::Null);
        };
        let literals = self.tables.literals.entry(arc_key(data_type)).or_default();
        if let Some(literal) = literals.get(id) {
            return Ok(Value::Enum(literal.clone()));
        }
        if id > literals.len() {
            return Err(BinaryError::InvalidObjectId {
                table: "literal",
                id: id as i64,
                next: literals.len(),
            });
        }
        let literal = read_str(pack)?;
        if data_type.literal_index(&literal).is_none() {
            return Err(BinaryError::UnknownLiteral {
                data_type: data_type.name().to_owned(),
                literal,
            });
        }
        literals.push(literal.clone());
        Ok(Value::Enum(literal))
    }
}

fn read_header(pack: &mut MsgPackDecoder) -> Result<(), BinaryError> {
    let signature = pack
        .read_raw(SIGNATURE.len())
        .map_err(|_| BinaryError::Signature)?;
    if signature != SIGNATURE {
        return Err(BinaryError::Signature);
    }
    match pack.read_scalar()? {
        PackValue::Int(VERSION) => Ok(()),
        PackValue::Int(version) => Err(BinaryError::UnsupportedVersion(version.to_string())),
        other => Err(BinaryError::UnsupportedVersion(other.type_name().to_owned())),
    }
}

/// A table index, or `None` for nil.
#[inline(never)]
fn read_reference(
    pack: &mut MsgPackDecoder,
    expected: &'static str,
) -> Result<Option<usize>, BinaryError> {
    let raw = pack.read_scalar()?;
    if raw.is_nil() {
        return Ok(None);
    }
    raw.as_i64()
        .and_then(|id| usize::try_from(id).ok())
        .map(Some)
        .ok_or(BinaryError::UnexpectedValue {
            expected,
            found: raw.type_name(),
        })
}

fn read_int(pack: &mut MsgPackDecoder, expected: &'static str) -> Result<i64, BinaryError> {
    let raw = pack.read_scalar()?;
    raw.as_i64().ok_or(BinaryError::UnexpectedValue {
        expected,
        found: raw.type_name(),
    })
}

fn read_index(pack: &mut MsgPackDecoder, expected: &'static str) -> Result<usize, BinaryError> {
    let value = read_int(pack, expected)?;
    usize::try_from(value).map_err(|_| BinaryError::UnexpectedValue {
        expected,
        found: "negative int",
    })
}

fn read_str(pack: &mut MsgPackDecoder) -> Result<String, BinaryError> {
    match pack.read_scalar()? {
        PackValue::Str(s) => Ok(s),
        other => Err(BinaryError::UnexpectedValue {
            expected: "string",
            found: other.type_name(),
        }),
    }
}

fn read_data(
    pack: &mut MsgPackDecoder,
    feature: &FeatureData,
    data_type: &EDataType,
) -> Result<Value, BinaryError> {
    match pack.read_scalar()? {
        PackValue::Nil => Ok(Value::Null),
        PackValue::Str(literal) => Ok(feature.factory.create_from_string(data_type, &literal)?),
        other => Err(BinaryError::UnexpectedValue {
            expected: "string",
            found: other.type_name(),
        }),
    }
}

fn read_native(pack: &mut MsgPackDecoder, kind: BinaryFeatureKind) -> Result<Value, BinaryError> {
    use BinaryFeatureKind as K;
    let raw = pack.read_scalar()?;
    let found = raw.type_name();
    let value = match (kind, raw) {
        (_, PackValue::Nil) => Value::Null,
        (K::Boolean, PackValue::Bool(b)) => Value::Bool(b),
        (K::Byte | K::Short | K::Int | K::Long, PackValue::Int(i)) => Value::Int(i),
        (K::Char, PackValue::Int(code)) => match u32::try_from(code).ok().and_then(char::from_u32) {
            Some(c) => Value::Char(c),
            None => {
                return Err(BinaryError::UnexpectedValue {
                    expected: "character code",
                    found,
                })
            }
        },
        (K::Float | K::Double, PackValue::Float32(x)) => Value::Float(f64::from(x)),
        (K::Float | K::Double, PackValue::Float64(x)) => Value::Float(x),
        (K::Float | K::Double, PackValue::Int(i)) => Value::Float(i as f64),
        (K::String, PackValue::Str(s)) => Value::Str(s),
        (K::ByteArray, PackValue::Bin(bytes)) => Value::Bytes(bytes),
        (K::Date, PackValue::Date(date)) => Value::Date(date),
        (kind, _) => {
            return Err(BinaryError::UnexpectedValue {
                expected: native_name(kind),
                found,
            })
        }
    };
    Ok(value)
}

fn native_name(kind: BinaryFeatureKind) -> &'static str {
    use BinaryFeatureKind as K;
    match kind {
        K::Boolean => "bool",
        K::Byte | K::Short | K::Int | K::Long => "int",
        K::Char => "character code",
        K::Float | K::Double => "float",
        K::String => "string",
        K::ByteArray => "bin",
        K::Date => "date",
        _ => "value",
    }
}
