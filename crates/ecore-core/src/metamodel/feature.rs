use std::sync::Arc;

use super::EDataType;
use crate::Value;

/// What a structural feature holds, decided once when the feature is built.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Attribute {
        data_type: Arc<EDataType>,
    },
    Reference {
        /// The referencing object owns the referenced ones.
        containment: bool,
        /// The feature points back at the owning container.
        container: bool,
        resolve_proxies: bool,
        /// Name of the opposite feature in the referenced class.
        opposite: Option<String>,
    },
}

/// A named, typed slot of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct EStructuralFeature {
    name: String,
    many: bool,
    transient: bool,
    kind: FeatureKind,
}

impl EStructuralFeature {
    pub fn attribute(name: impl Into<String>, data_type: Arc<EDataType>) -> Self {
        Self {
            name: name.into(),
            many: false,
            transient: false,
            kind: FeatureKind::Attribute { data_type },
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            many: false,
            transient: false,
            kind: FeatureKind::Reference {
                containment: false,
                container: false,
                resolve_proxies: true,
                opposite: None,
            },
        }
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn containment(mut self) -> Self {
        if let FeatureKind::Reference { containment, .. } = &mut self.kind {
            *containment = true;
        }
        self
    }

    /// Marks a reference as the container side of the containment named `opposite`.
    pub fn container(mut self, opposite: impl Into<String>) -> Self {
        if let FeatureKind::Reference {
            container,
            opposite: slot,
            ..
        } = &mut self.kind
        {
            *container = true;
            *slot = Some(opposite.into());
        }
        self
    }

    pub fn opposite(mut self, name: impl Into<String>) -> Self {
        if let FeatureKind::Reference { opposite, .. } = &mut self.kind {
            *opposite = Some(name.into());
        }
        self
    }

    pub fn non_resolving(mut self) -> Self {
        if let FeatureKind::Reference {
            resolve_proxies, ..
        } = &mut self.kind
        {
            *resolve_proxies = false;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, FeatureKind::Attribute { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { .. })
    }

    pub fn is_containment(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                containment: true,
                ..
            }
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, FeatureKind::Reference { container: true, .. })
    }

    pub fn resolves_proxies(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Reference {
                resolve_proxies: true,
                ..
            }
        )
    }

    pub fn opposite_name(&self) -> Option<&str> {
        match &self.kind {
            FeatureKind::Reference { opposite, .. } => opposite.as_deref(),
            FeatureKind::Attribute { .. } => None,
        }
    }

    pub fn data_type(&self) -> Option<&Arc<EDataType>> {
        match &self.kind {
            FeatureKind::Attribute { data_type } => Some(data_type),
            FeatureKind::Reference { .. } => None,
        }
    }

    /// What `e_get` reports while the feature is unset.
    pub fn default_value(&self) -> Value {
        if self.many {
            return Value::List(Vec::new());
        }
        match &self.kind {
            FeatureKind::Attribute { data_type } => data_type.default_value(),
            FeatureKind::Reference { .. } => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_flags() {
        let books = EStructuralFeature::reference("books")
            .containment()
            .many()
            .opposite("library");
        assert!(books.is_containment());
        assert!(books.is_many());
        assert!(!books.is_container());
        assert!(books.resolves_proxies());
        assert_eq!(books.opposite_name(), Some("library"));
        assert_eq!(books.default_value(), Value::List(vec![]));

        let library = EStructuralFeature::reference("library").container("books");
        assert!(library.is_container());
        assert_eq!(library.opposite_name(), Some("books"));
    }

    #[test]
    fn reference_modifiers_do_not_touch_attributes() {
        let string = Arc::new(EDataType::new("EString", Some("String")));
        let title = EStructuralFeature::attribute("title", string)
            .containment()
            .opposite("x");
        assert!(title.is_attribute());
        assert!(!title.is_containment());
        assert_eq!(title.opposite_name(), None);
    }
}
