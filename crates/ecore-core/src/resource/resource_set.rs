use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::Resource;
use crate::metamodel::{EPackage, PackageRegistry};
use crate::object::EObjectRef;
use crate::Value;

/// A group of resources that may reference each other, with a package
/// registry of its own.
#[derive(Default)]
pub struct ResourceSet {
    resources: RefCell<Vec<Rc<Resource>>>,
    packages: PackageRegistry,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_resource(&self, uri: impl Into<String>) -> Rc<Resource> {
        let resource = Resource::new(uri);
        self.add_resource(resource.clone());
        resource
    }

    pub fn add_resource(&self, resource: Rc<Resource>) {
        self.resources.borrow_mut().push(resource);
    }

    pub fn resources(&self) -> Vec<Rc<Resource>> {
        self.resources.borrow().clone()
    }

    pub fn get_resource(&self, uri: &str) -> Option<Rc<Resource>> {
        self.resources
            .borrow()
            .iter()
            .find(|r| r.uri() == uri)
            .cloned()
    }

    /// Packages visible to this set only, consulted before the global registry.
    pub fn package_registry(&self) -> &PackageRegistry {
        &self.packages
    }

    pub fn register_package(&self, package: Arc<EPackage>) -> Option<Arc<EPackage>> {
        self.packages.register(package)
    }

    pub fn lookup_package(&self, ns_uri: &str) -> Option<Arc<EPackage>> {
        self.packages
            .get(ns_uri)
            .or_else(|| PackageRegistry::global().get(ns_uri))
    }

    /// Finds the object addressed by `resource-uri#fragment`.
    pub fn get_eobject(&self, uri: &str) -> Option<EObjectRef> {
        let (resource_uri, fragment) = uri.split_once('#')?;
        self.get_resource(resource_uri)?.get_eobject(fragment)
    }

    /// The object a proxy stands for, if it can be found in this set.
    pub fn resolve_proxy(&self, proxy: &EObjectRef) -> Option<EObjectRef> {
        self.get_eobject(&proxy.e_proxy_uri()?)
    }

    /// Reads a feature, replacing proxies it holds with their targets.
    pub fn get_resolved(&self, object: &EObjectRef, feature_id: usize) -> Value {
        object.e_get_resolved(feature_id, &|proxy| self.resolve_proxy(proxy))
    }
}
