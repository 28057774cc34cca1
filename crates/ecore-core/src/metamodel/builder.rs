//! Builders that assemble a package from names.
//!
//! Classes refer to data types and super types by name; `build` resolves
//! every name and only then freezes the package.

use std::collections::HashSet;
use std::sync::Arc;

use super::{
    ecore_data_type, DynamicFactory, EClass, EDataType, EFactory, EPackage, EStructuralFeature,
    MetamodelError,
};

/// A feature declaration whose data type is still a name.
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    name: String,
    data_type: Option<String>,
    many: bool,
    transient: bool,
    containment: bool,
    container: bool,
    resolve_proxies: bool,
    opposite: Option<String>,
}

impl FeatureSpec {
    pub fn attribute(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            data_type: Some(data_type.into()),
            ..Self::reference(name)
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            many: false,
            transient: false,
            containment: false,
            container: false,
            resolve_proxies: true,
            opposite: None,
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
        self.containment = true;
        self
    }

    /// The container side of the containment reference named `containment`.
    pub fn container(mut self, containment: impl Into<String>) -> Self {
        self.container = true;
        self.opposite = Some(containment.into());
        self
    }

    pub fn opposite(mut self, name: impl Into<String>) -> Self {
        self.opposite = Some(name.into());
        self
    }

    pub fn non_resolving(mut self) -> Self {
        self.resolve_proxies = false;
        self
    }

    fn resolve(
        self,
        class: &str,
        lookup: &dyn Fn(&str) -> Option<Arc<EDataType>>,
    ) -> Result<EStructuralFeature, MetamodelError> {
        let mut feature = match &self.data_type {
            Some(type_name) => {
                let data_type = lookup(type_name).ok_or_else(|| MetamodelError::UnknownDataType {
                    class: class.to_owned(),
                    feature: self.name.clone(),
                    data_type: type_name.clone(),
                })?;
                EStructuralFeature::attribute(&self.name, data_type)
            }
            None => {
                if self.containment && self.container {
                    return Err(MetamodelError::ConflictingReference {
                        class: class.to_owned(),
                        feature: self.name,
                    });
                }
                let mut reference = EStructuralFeature::reference(&self.name);
                if self.containment {
                    reference = reference.containment();
                }
                match (&self.opposite, self.container) {
                    (Some(opposite), true) => reference = reference.container(opposite),
                    (Some(opposite), false) => reference = reference.opposite(opposite),
                    (None, _) => {}
                }
                if !self.resolve_proxies {
                    reference = reference.non_resolving();
                }
                reference
            }
        };
        if self.many {
            feature = feature.many();
        }
        if self.transient {
            feature = feature.transient();
        }
        Ok(feature)
    }
}

#[derive(Debug, Clone)]
pub struct EClassBuilder {
    name: String,
    is_abstract: bool,
    super_types: Vec<String>,
    features: Vec<FeatureSpec>,
}

impl EClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            super_types: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Adds a super type; it must be declared earlier in the same package.
    pub fn super_type(mut self, name: impl Into<String>) -> Self {
        self.super_types.push(name.into());
        self
    }

    pub fn feature(mut self, feature: FeatureSpec) -> Self {
        self.features.push(feature);
        self
    }

    pub fn attribute(self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.feature(FeatureSpec::attribute(name, data_type))
    }
}

pub struct EPackageBuilder {
    name: String,
    ns_uri: String,
    ns_prefix: String,
    data_types: Vec<EDataType>,
    classes: Vec<EClassBuilder>,
    factory: Option<Arc<dyn EFactory>>,
}

struct ResolvedClass {
    name: String,
    is_abstract: bool,
    super_types: Vec<usize>,
    features: Vec<EStructuralFeature>,
}

impl EPackageBuilder {
    pub fn new(name: impl Into<String>, ns_uri: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ns_prefix: name.to_lowercase(),
            name,
            ns_uri: ns_uri.into(),
            data_types: Vec::new(),
            classes: Vec::new(),
            factory: None,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ns_prefix = prefix.into();
        self
    }

    pub fn data_type(mut self, data_type: EDataType) -> Self {
        self.data_types.push(data_type);
        self
    }

    pub fn class(mut self, class: EClassBuilder) -> Self {
        self.classes.push(class);
        self
    }

    /// Replaces the default [`DynamicFactory`].
    pub fn factory(mut self, factory: Arc<dyn EFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<Arc<EPackage>, MetamodelError> {
        let mut names = HashSet::new();
        for name in self
            .data_types
            .iter()
            .map(|d| d.name())
            .chain(self.classes.iter().map(|c| c.name.as_str()))
        {
            if !names.insert(name) {
                return Err(MetamodelError::DuplicateClassifier(name.to_owned()));
            }
        }

        let data_types: Vec<Arc<EDataType>> = self.data_types.into_iter().map(Arc::new).collect();
        let lookup = |name: &str| {
            data_types
                .iter()
                .find(|d| d.name() == name)
                .cloned()
                .or_else(|| ecore_data_type(name))
        };

        // Flattened feature origins per class as (declaring class, own index),
        // so a feature inherited along two paths is counted once.
        let mut origins: Vec<Vec<(usize, usize)>> = Vec::with_capacity(self.classes.len());
        let mut resolved: Vec<ResolvedClass> = Vec::with_capacity(self.classes.len());
        for (index, class) in self.classes.iter().enumerate() {
            let mut super_types = Vec::with_capacity(class.super_types.len());
            for super_name in &class.super_types {
                let position = self.classes[..index]
                    .iter()
                    .position(|c| &c.name == super_name)
                    .ok_or_else(|| MetamodelError::UnknownSuperType {
                        class: class.name.clone(),
                        super_type: super_name.clone(),
                    })?;
                super_types.push(position);
            }

            let mut flat: Vec<(usize, usize)> = Vec::new();
            for &s in &super_types {
                for origin in &origins[s] {
                    if !flat.contains(origin) {
                        flat.push(*origin);
                    }
                }
            }
            flat.extend((0..class.features.len()).map(|k| (index, k)));

            let mut seen = HashSet::new();
            for &(declaring, k) in &flat {
                let feature_name = self.classes[declaring].features[k].name.as_str();
                if !seen.insert(feature_name) {
                    return Err(MetamodelError::DuplicateFeature {
                        class: class.name.clone(),
                        feature: feature_name.to_owned(),
                    });
                }
            }

            let features = class
                .features
                .iter()
                .cloned()
                .map(|spec| spec.resolve(&class.name, &lookup))
                .collect::<Result<Vec<_>, _>>()?;
            origins.push(flat);
            resolved.push(ResolvedClass {
                name: class.name.clone(),
                is_abstract: class.is_abstract,
                super_types,
                features,
            });
        }

        let factory = self.factory.unwrap_or_else(|| Arc::new(DynamicFactory));
        let (name, ns_uri, ns_prefix) = (self.name, self.ns_uri, self.ns_prefix);
        Ok(Arc::new_cyclic(|package| {
            let mut classes: Vec<Arc<EClass>> = Vec::with_capacity(resolved.len());
            for class in resolved {
                let super_types = class.super_types.iter().map(|&s| classes[s].clone()).collect();
                classes.push(Arc::new(EClass::new(
                    class.name,
                    class.is_abstract,
                    package.clone(),
                    super_types,
                    class.features,
                )));
            }
            EPackage {
                name,
                ns_uri,
                ns_prefix,
                classes,
                data_types,
                factory,
            }
        }))
    }
}
