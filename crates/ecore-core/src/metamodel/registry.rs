use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::EPackage;

/// Packages by namespace URI.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: RwLock<HashMap<String, Arc<EPackage>>>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, built on first use.
    pub fn global() -> &'static PackageRegistry {
        static GLOBAL: OnceLock<PackageRegistry> = OnceLock::new();
        GLOBAL.get_or_init(PackageRegistry::new)
    }

    /// Registers `package` under its namespace URI, returning the package it replaced.
    pub fn register(&self, package: Arc<EPackage>) -> Option<Arc<EPackage>> {
        let mut packages = self.packages.write().unwrap_or_else(PoisonError::into_inner);
        packages.insert(package.ns_uri().to_owned(), package)
    }

    pub fn get(&self, ns_uri: &str) -> Option<Arc<EPackage>> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        packages.get(ns_uri).cloned()
    }

    pub fn remove(&self, ns_uri: &str) -> Option<Arc<EPackage>> {
        let mut packages = self.packages.write().unwrap_or_else(PoisonError::into_inner);
        packages.remove(ns_uri)
    }

    pub fn len(&self) -> usize {
        self.packages.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
