use std::fmt;
use std::sync::Arc;

use super::{EClass, EDataType, EFactory};

/// A namespace of classes and data types, identified by its namespace URI.
pub struct EPackage {
    pub(crate) name: String,
    pub(crate) ns_uri: String,
    pub(crate) ns_prefix: String,
    pub(crate) classes: Vec<Arc<EClass>>,
    pub(crate) data_types: Vec<Arc<EDataType>>,
    pub(crate) factory: Arc<dyn EFactory>,
}

impl EPackage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    pub fn ns_prefix(&self) -> &str {
        &self.ns_prefix
    }

    pub fn classes(&self) -> &[Arc<EClass>] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&Arc<EClass>> {
        self.classes.iter().find(|c| c.name() == name)
    }

    pub fn data_types(&self) -> &[Arc<EDataType>] {
        &self.data_types
    }

    pub fn data_type(&self, name: &str) -> Option<&Arc<EDataType>> {
        self.data_types.iter().find(|d| d.name() == name)
    }

    pub fn factory(&self) -> &Arc<dyn EFactory> {
        &self.factory
    }
}

impl fmt::Debug for EPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EPackage")
            .field("name", &self.name)
            .field("ns_uri", &self.ns_uri)
            .field("classes", &self.classes.iter().map(|c| c.name()).collect::<Vec<_>>())
            .finish()
    }
}
