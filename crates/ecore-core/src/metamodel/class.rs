use std::fmt;
use std::sync::{Arc, Weak};

use super::{EPackage, EStructuralFeature};

/// A modeled class.
///
/// Feature IDs index the flattened feature table: inherited features first,
/// in super-type order, followed by the class's own features.
pub struct EClass {
    name: String,
    is_abstract: bool,
    package: Weak<EPackage>,
    super_types: Vec<Arc<EClass>>,
    features: Vec<Arc<EStructuralFeature>>,
    own_start: usize,
}

impl EClass {
    pub(crate) fn new(
        name: String,
        is_abstract: bool,
        package: Weak<EPackage>,
        super_types: Vec<Arc<EClass>>,
        own: Vec<EStructuralFeature>,
    ) -> Self {
        let mut features: Vec<Arc<EStructuralFeature>> = Vec::new();
        for super_type in &super_types {
            for feature in super_type.features() {
                if !features.iter().any(|f| Arc::ptr_eq(f, feature)) {
                    features.push(feature.clone());
                }
            }
        }
        let own_start = features.len();
        features.extend(own.into_iter().map(Arc::new));
        Self {
            name,
            is_abstract,
            package,
            super_types,
            features,
            own_start,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn package(&self) -> Option<Arc<EPackage>> {
        self.package.upgrade()
    }

    pub fn super_types(&self) -> &[Arc<EClass>] {
        &self.super_types
    }

    /// Whether `other` is this class or one of its (transitive) super types.
    pub fn is_sub_type_of(&self, other: &EClass) -> bool {
        std::ptr::eq(self, other) || self.super_types.iter().any(|s| s.is_sub_type_of(other))
    }

    pub fn features(&self) -> &[Arc<EStructuralFeature>] {
        &self.features
    }

    pub fn own_features(&self) -> &[Arc<EStructuralFeature>] {
        &self.features[self.own_start..]
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, feature_id: usize) -> Option<&Arc<EStructuralFeature>> {
        self.features.get(feature_id)
    }

    pub fn feature_id(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name() == name)
    }

    pub fn feature_by_name(&self, name: &str) -> Option<&Arc<EStructuralFeature>> {
        self.features.iter().find(|f| f.name() == name)
    }

    /// ID of `feature` in this class, matched by identity.
    pub fn feature_id_of(&self, feature: &Arc<EStructuralFeature>) -> Option<usize> {
        self.features.iter().position(|f| Arc::ptr_eq(f, feature))
    }
}

impl fmt::Debug for EClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EClass")
            .field("name", &self.name)
            .field("abstract", &self.is_abstract)
            .field(
                "features",
                &self.features.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
