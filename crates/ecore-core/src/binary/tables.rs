//! Stream-local dictionaries.
//!
//! IDs are handed out in first-seen order and live for one encode or decode
//! call. Packages, classes, features and enum literals are named only on
//! first occurrence; objects get an ID the moment they are first reached so
//! that later references, including cyclic ones, can point back at them.

use std::collections::HashMap;
use std::sync::Arc;

use super::BinaryFeatureKind;
use crate::metamodel::{DynamicFactory, EClass, EDataType, EFactory, EPackage, EStructuralFeature};
use crate::object::{object_key, EObjectRef};

pub(crate) fn arc_key<T: ?Sized>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

/// Factory converting data values of `class`'s attributes.
pub(crate) fn factory_of(class: &EClass) -> Arc<dyn EFactory> {
    match class.package() {
        Some(package) => package.factory().clone(),
        None => Arc::new(DynamicFactory),
    }
}

#[derive(Default)]
pub(crate) struct EncoderTables {
    packages: HashMap<usize, usize>,
    classes: HashMap<usize, usize>,
    /// Next class ID per package ID.
    class_counts: Vec<usize>,
    features: HashMap<(usize, usize), BinaryFeatureKind>,
    literals: HashMap<usize, HashMap<String, usize>>,
    objects: HashMap<usize, usize>,
    /// Holds every numbered object so its address stays unique for the call.
    retained: Vec<EObjectRef>,
}

impl EncoderTables {
    pub fn object_id(&self, object: &EObjectRef) -> Option<usize> {
        self.objects.get(&object_key(object)).copied()
    }

    pub fn add_object(&mut self, object: &EObjectRef) -> usize {
        let id = self.retained.len();
        self.objects.insert(object_key(object), id);
        self.retained.push(object.clone());
        id
    }

    pub fn object_count(&self) -> usize {
        self.retained.len()
    }

    /// Package ID, and whether this is its first occurrence.
    pub fn package_id(&mut self, package: &Arc<EPackage>) -> (usize, bool) {
        let next = self.packages.len();
        match self.packages.get(&arc_key(package)) {
            Some(&id) => (id, false),
            None => {
                self.packages.insert(arc_key(package), next);
                self.class_counts.push(0);
                (next, true)
            }
        }
    }

    /// Class ID within `package_id`, and whether this is its first occurrence.
    pub fn class_id(&mut self, package_id: usize, class: &Arc<EClass>) -> (usize, bool) {
        if let Some(&id) = self.classes.get(&arc_key(class)) {
            return (id, false);
        }
        let id = match self.class_counts.get_mut(package_id) {
            Some(count) => {
                *count += 1;
                *count - 1
            }
            None => 0,
        };
        self.classes.insert(arc_key(class), id);
        (id, true)
    }

    /// Layout of a feature, and whether this is its first occurrence for the class.
    pub fn feature(
        &mut self,
        class: &Arc<EClass>,
        feature_id: usize,
        feature: &EStructuralFeature,
    ) -> (BinaryFeatureKind, bool) {
        let key = (arc_key(class), feature_id);
        match self.features.get(&key) {
            Some(&kind) => (kind, false),
            None => {
                let kind = BinaryFeatureKind::of(feature);
                self.features.insert(key, kind);
                (kind, true)
            }
        }
    }

    /// Literal ID within `data_type`, and whether this is its first occurrence.
    pub fn literal_id(&mut self, data_type: &Arc<EDataType>, literal: &str) -> (usize, bool) {
        let literals = self.literals.entry(arc_key(data_type)).or_default();
        if let Some(&id) = literals.get(literal) {
            return (id, false);
        }
        let id = literals.len();
        literals.insert(literal.to_owned(), id);
        (id, true)
    }
}

pub(crate) struct PackageData {
    pub package: Arc<EPackage>,
    pub classes: Vec<ClassData>,
}

pub(crate) struct ClassData {
    pub class: Arc<EClass>,
    pub factory: Arc<dyn EFactory>,
    /// Keyed by the writer's feature ID.
    pub features: HashMap<usize, FeatureData>,
}

#[derive(Clone)]
pub(crate) struct FeatureData {
    /// ID of the feature in the reader's class.
    pub feature_id: usize,
    pub feature: Arc<EStructuralFeature>,
    pub kind: BinaryFeatureKind,
    pub factory: Arc<dyn EFactory>,
}

#[derive(Default)]
pub(crate) struct DecoderTables {
    pub packages: Vec<PackageData>,
    pub literals: HashMap<usize, Vec<String>>,
    pub objects: Vec<EObjectRef>,
}

impl PackageData {
    pub fn new(package: Arc<EPackage>) -> Self {
        Self {
            package,
            classes: Vec::new(),
        }
    }
}

impl ClassData {
    pub fn new(class: Arc<EClass>) -> Self {
        Self {
            factory: factory_of(&class),
            class,
            features: HashMap::new(),
        }
    }
}
