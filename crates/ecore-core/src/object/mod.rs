//! Modeled objects.
//!
//! Everything in the crate talks to objects through [`EObject`]; the
//! reflective [`DynamicEObject`] is the implementation the default factory
//! hands out.

mod dynamic;

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use thiserror::Error;

pub use dynamic::DynamicEObject;

use crate::metamodel::EClass;
use crate::notify::{AdapterRef, Notification, NotificationChain};
use crate::resource::Resource;
use crate::Value;

pub type EObjectRef = Rc<dyn EObject>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("class {class} has no feature {feature_id}")]
    NoSuchFeature { class: String, feature_id: usize },
    #[error("feature {feature} is single-valued")]
    NotMany { feature: String },
    #[error("feature {feature} expects {expected}, got {found}")]
    InvalidValue {
        feature: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("index {index} is out of bounds for feature {feature} of length {len}")]
    IndexOutOfBounds {
        feature: String,
        index: usize,
        len: usize,
    },
}

/// Reflective access to a modeled object.
///
/// Mutators take `&self` and notify the object's adapters once the mutation,
/// including any inverse updates on other objects, has completed.
pub trait EObject {
    fn e_class(&self) -> Arc<EClass>;

    /// Current value of a feature, or its default while unset.
    fn e_get(&self, feature_id: usize) -> Value;
    fn e_is_set(&self, feature_id: usize) -> bool;
    fn e_set(&self, feature_id: usize, value: Value) -> Result<(), ModelError>;
    fn e_unset(&self, feature_id: usize) -> Result<(), ModelError>;

    fn e_insert(&self, feature_id: usize, index: usize, value: Value) -> Result<(), ModelError>;
    fn e_remove_at(&self, feature_id: usize, index: usize) -> Result<Value, ModelError>;
    /// Moves the element at `from` to `to`, returning it.
    fn e_move(&self, feature_id: usize, from: usize, to: usize) -> Result<Value, ModelError>;

    fn e_add(&self, feature_id: usize, value: Value) -> Result<(), ModelError> {
        let len = self.e_get(feature_id).as_list().map_or(0, <[Value]>::len);
        self.e_insert(feature_id, len, value)
    }

    /// Removes the first element equal to `value`; `false` if there was none.
    fn e_remove(&self, feature_id: usize, value: &Value) -> Result<bool, ModelError> {
        let position = self
            .e_get(feature_id)
            .as_list()
            .and_then(|items| items.iter().position(|v| v == value));
        match position {
            Some(index) => self.e_remove_at(feature_id, index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Like [`e_get`](Self::e_get), but proxies held by a proxy-resolving
    /// reference are replaced by what `resolver` finds for them.
    fn e_get_resolved(
        &self,
        feature_id: usize,
        resolver: &dyn Fn(&EObjectRef) -> Option<EObjectRef>,
    ) -> Value;

    fn e_container(&self) -> Option<EObjectRef>;
    /// ID, in the container's class, of the containment feature holding this object.
    fn e_container_feature_id(&self) -> Option<usize>;

    /// Records the new container without touching the container itself.
    fn e_basic_set_container(
        &self,
        container: Option<(&EObjectRef, usize)>,
        chain: &mut NotificationChain,
    );
    /// Adds `other` to this side of a bidirectional reference only.
    fn e_inverse_add(&self, other: &EObjectRef, feature_id: usize, chain: &mut NotificationChain);
    /// Removes `other` from this side of a bidirectional reference only.
    fn e_inverse_remove(
        &self,
        other: &EObjectRef,
        feature_id: usize,
        chain: &mut NotificationChain,
    );

    /// The resource this object is a root of, if any.
    fn e_direct_resource(&self) -> Option<Rc<Resource>>;
    fn e_set_direct_resource(&self, resource: Option<&Rc<Resource>>);

    fn e_proxy_uri(&self) -> Option<String>;
    fn e_set_proxy_uri(&self, uri: Option<String>);

    fn e_is_proxy(&self) -> bool {
        self.e_proxy_uri().is_some()
    }

    fn e_adapters(&self) -> Vec<AdapterRef>;
    fn e_add_adapter(&self, adapter: AdapterRef);
    fn e_remove_adapter(&self, adapter: &AdapterRef) -> bool;
    fn e_deliver(&self) -> bool;
    fn e_set_deliver(&self, deliver: bool);
    fn e_notify(&self, notification: &Notification);
}

impl fmt::Debug for dyn EObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.e_class();
        match self.e_proxy_uri() {
            Some(uri) => write!(f, "{} proxy {uri}", class.name()),
            None => write!(f, "{}@{:p}", class.name(), self as *const Self as *const ()),
        }
    }
}

/// Identity comparison of two object handles.
pub fn same_object(a: &EObjectRef, b: &EObjectRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Address-based key identifying an object while it is alive.
pub(crate) fn object_key(object: &EObjectRef) -> usize {
    Rc::as_ptr(object) as *const () as usize
}

/// Objects directly contained by `object`, in feature order.
pub fn e_contents(object: &EObjectRef) -> Vec<EObjectRef> {
    let class = object.e_class();
    class
        .features()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_containment())
        .flat_map(|(id, _)| object.e_get(id).objects())
        .collect()
}

/// Every object transitively contained by `object`, depth first.
pub fn e_all_contents(object: &EObjectRef) -> Vec<EObjectRef> {
    let mut out = Vec::new();
    let mut stack: Vec<EObjectRef> = e_contents(object).into_iter().rev().collect();
    while let Some(next) = stack.pop() {
        stack.extend(e_contents(&next).into_iter().rev());
        out.push(next);
    }
    out
}

pub fn e_root_container(object: &EObjectRef) -> EObjectRef {
    let mut current = object.clone();
    while let Some(container) = current.e_container() {
        current = container;
    }
    current
}

/// The resource `object` belongs to through its root container.
pub fn e_resource(object: &EObjectRef) -> Option<Rc<Resource>> {
    e_root_container(object).e_direct_resource()
}
