use crate::metamodel::{EStructuralFeature, FeatureKind, NativeType};

/// How a feature's value is laid out in a binary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFeatureKind {
    ObjectContainer,
    ObjectContainerProxyResolving,
    Object,
    ObjectProxyResolving,
    ObjectList,
    ObjectListProxyResolving,
    ObjectContainment,
    ObjectContainmentProxyResolving,
    ObjectContainmentList,
    ObjectContainmentListProxyResolving,
    /// Data value carried as its factory's string form.
    Data,
    DataList,
    Enumerator,
    EnumeratorList,
    Boolean,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    String,
    ByteArray,
    Date,
}

impl BinaryFeatureKind {
    pub fn of(feature: &EStructuralFeature) -> Self {
        match feature.kind() {
            FeatureKind::Reference {
                containment,
                container,
                resolve_proxies,
                ..
            } => match (*container, *containment, feature.is_many(), *resolve_proxies) {
                (true, _, _, true) => Self::ObjectContainerProxyResolving,
                (true, _, _, false) => Self::ObjectContainer,
                (false, true, true, true) => Self::ObjectContainmentListProxyResolving,
                (false, true, true, false) => Self::ObjectContainmentList,
                (false, true, false, true) => Self::ObjectContainmentProxyResolving,
                (false, true, false, false) => Self::ObjectContainment,
                (false, false, true, true) => Self::ObjectListProxyResolving,
                (false, false, true, false) => Self::ObjectList,
                (false, false, false, true) => Self::ObjectProxyResolving,
                (false, false, false, false) => Self::Object,
            },
            FeatureKind::Attribute { data_type } => {
                if data_type.is_enum() {
                    return if feature.is_many() {
                        Self::EnumeratorList
                    } else {
                        Self::Enumerator
                    };
                }
                if feature.is_many() {
                    return Self::DataList;
                }
                match data_type.native_type() {
                    Some(NativeType::Boolean) => Self::Boolean,
                    Some(NativeType::Byte) => Self::Byte,
                    Some(NativeType::Char) => Self::Char,
                    Some(NativeType::Double) => Self::Double,
                    Some(NativeType::Float) => Self::Float,
                    Some(NativeType::Int) => Self::Int,
                    Some(NativeType::Long) => Self::Long,
                    Some(NativeType::Short) => Self::Short,
                    Some(NativeType::String) => Self::String,
                    Some(NativeType::ByteArray) => Self::ByteArray,
                    Some(NativeType::Date) => Self::Date,
                    None => Self::Data,
                }
            }
        }
    }

    /// A single object reference, written as a nested object.
    pub fn is_object(self) -> bool {
        matches!(
            self,
            Self::ObjectContainer
                | Self::ObjectContainerProxyResolving
                | Self::Object
                | Self::ObjectProxyResolving
                | Self::ObjectContainment
                | Self::ObjectContainmentProxyResolving
        )
    }

    /// A list of object references, written as a count and nested objects.
    pub fn is_object_list(self) -> bool {
        matches!(
            self,
            Self::ObjectList
                | Self::ObjectListProxyResolving
                | Self::ObjectContainmentList
                | Self::ObjectContainmentListProxyResolving
        )
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::ObjectContainer | Self::ObjectContainerProxyResolving
        )
    }
}
