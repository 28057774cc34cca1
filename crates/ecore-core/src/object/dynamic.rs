use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use super::{same_object, EObject, EObjectRef, ModelError};
use crate::metamodel::{EClass, EStructuralFeature};
use crate::notify::{same_adapter, AdapterRef, EventType, Notification, NotificationChain};
use crate::resource::Resource;
use crate::Value;

/// Reflective object storing one slot per feature of its class.
///
/// Reference lists never hold the same object twice. Container features have
/// no slot; they are read off the container pointer.
pub struct DynamicEObject {
    this: Weak<DynamicEObject>,
    class: Arc<EClass>,
    slots: RefCell<Vec<Option<Value>>>,
    container: RefCell<Option<(Weak<dyn EObject>, usize)>>,
    resource: RefCell<Weak<Resource>>,
    proxy_uri: RefCell<Option<String>>,
    adapters: RefCell<Vec<AdapterRef>>,
    deliver: Cell<bool>,
}

impl DynamicEObject {
    pub fn new(class: Arc<EClass>) -> Rc<DynamicEObject> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            slots: RefCell::new(vec![None; class.feature_count()]),
            class,
            container: RefCell::new(None),
            resource: RefCell::new(Weak::new()),
            proxy_uri: RefCell::new(None),
            adapters: RefCell::new(Vec::new()),
            deliver: Cell::new(true),
        })
    }

    fn handle(&self) -> Option<EObjectRef> {
        self.this.upgrade().map(|rc| rc as EObjectRef)
    }

    fn feature(&self, feature_id: usize) -> Result<Arc<EStructuralFeature>, ModelError> {
        self.class
            .feature(feature_id)
            .cloned()
            .ok_or_else(|| ModelError::NoSuchFeature {
                class: self.class.name().to_owned(),
                feature_id,
            })
    }

    fn slot(&self, feature_id: usize) -> Option<Value> {
        self.slots.borrow().get(feature_id).cloned().flatten()
    }

    fn store(&self, feature_id: usize, value: Option<Value>) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(feature_id) {
            *slot = value;
        }
    }

    fn list(&self, feature_id: usize) -> Vec<Value> {
        match self.slot(feature_id) {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        }
    }

    fn container_pair(&self) -> Option<(EObjectRef, usize)> {
        let container = self.container.borrow();
        let (weak, feature_id) = container.as_ref()?;
        weak.upgrade().map(|c| (c, *feature_id))
    }

    /// This class's container feature mirroring `containment_id` of `container`.
    fn container_feature_for(
        &self,
        container: &EObjectRef,
        containment_id: usize,
    ) -> Option<usize> {
        let container_class = container.e_class();
        let containment = container_class.feature(containment_id)?;
        self.class
            .features()
            .iter()
            .position(|f| f.is_container() && f.opposite_name() == Some(containment.name()))
    }

    fn opposite_id(feature: &EStructuralFeature, target: &EObjectRef) -> Option<usize> {
        feature
            .opposite_name()
            .and_then(|name| target.e_class().feature_id(name))
    }

    fn checked_single(feature: &EStructuralFeature, value: Value) -> Result<Value, ModelError> {
        let valid = match &value {
            Value::List(_) => false,
            Value::Null => true,
            Value::Object(_) => feature.is_reference(),
            _ => feature.is_attribute(),
        };
        if valid {
            Ok(value)
        } else {
            Err(invalid(feature, expected_value(feature), &value))
        }
    }

    /// Null elements are only allowed in attribute lists.
    fn checked_element(feature: &EStructuralFeature, value: Value) -> Result<Value, ModelError> {
        let valid = match &value {
            Value::List(_) => false,
            Value::Object(_) => feature.is_reference(),
            _ => feature.is_attribute(),
        };
        if valid {
            Ok(value)
        } else {
            Err(invalid(feature, expected_value(feature), &value))
        }
    }

    fn checked_list(feature: &EStructuralFeature, value: Value) -> Result<Vec<Value>, ModelError> {
        let items = match value {
            Value::Null => return Ok(Vec::new()),
            Value::List(items) => items,
            other => return Err(invalid(feature, "a list", &other)),
        };
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            let item = Self::checked_element(feature, item)?;
            if let Value::Object(obj) = &item {
                if out.iter().any(|v| v.holds(obj)) {
                    continue;
                }
            }
            out.push(item);
        }
        Ok(out)
    }

    /// Establishes the far side of a reference from `me` to `target`.
    fn link(
        &self,
        me: &EObjectRef,
        feature: &EStructuralFeature,
        feature_id: usize,
        target: &EObjectRef,
        chain: &mut NotificationChain,
    ) {
        if feature.is_containment() {
            if let (Some(previous), Some(previous_id)) =
                (target.e_container(), target.e_container_feature_id())
            {
                if !(same_object(&previous, me) && previous_id == feature_id) {
                    previous.e_inverse_remove(target, previous_id, chain);
                }
            }
            target.e_basic_set_container(Some((me, feature_id)), chain);
        } else if let Some(opposite) = Self::opposite_id(feature, target) {
            target.e_inverse_add(me, opposite, chain);
        }
    }

    /// Tears down the far side of a reference from `me` to `target`.
    fn unlink(
        &self,
        me: &EObjectRef,
        feature: &EStructuralFeature,
        feature_id: usize,
        target: &EObjectRef,
        chain: &mut NotificationChain,
    ) {
        if feature.is_containment() {
            let contained_here = target.e_container().is_some_and(|c| same_object(&c, me))
                && target.e_container_feature_id() == Some(feature_id);
            if contained_here {
                target.e_basic_set_container(None, chain);
            }
        } else if let Some(opposite) = Self::opposite_id(feature, target) {
            target.e_inverse_remove(me, opposite, chain);
        }
    }

    /// Moves this object into `new` through the container feature `feature`.
    fn set_container(
        &self,
        me: &EObjectRef,
        feature: &EStructuralFeature,
        new: Option<EObjectRef>,
        chain: &mut NotificationChain,
    ) -> Result<(), ModelError> {
        let target = match new {
            Some(container) => {
                let containment_id = Self::opposite_id(feature, &container).ok_or_else(|| {
                    invalid(
                        feature,
                        "an object owning the opposite containment",
                        &Value::Object(container.clone()),
                    )
                })?;
                Some((container, containment_id))
            }
            None => None,
        };
        let current = self.container_pair();
        match (&current, &target) {
            (None, None) => return Ok(()),
            (Some((c, cid)), Some((n, nid))) if same_object(c, n) && cid == nid => return Ok(()),
            _ => {}
        }
        if let Some((container, containment_id)) = &current {
            container.e_inverse_remove(me, *containment_id, chain);
        }
        match &target {
            Some((container, containment_id)) => {
                container.e_inverse_add(me, *containment_id, chain);
                self.e_basic_set_container(Some((container, *containment_id)), chain);
            }
            None => self.e_basic_set_container(None, chain),
        }
        Ok(())
    }
}

fn invalid(feature: &EStructuralFeature, expected: &'static str, found: &Value) -> ModelError {
    ModelError::InvalidValue {
        feature: feature.name().to_owned(),
        expected,
        found: found.type_name(),
    }
}

fn expected_value(feature: &EStructuralFeature) -> &'static str {
    if feature.is_reference() {
        "an object"
    } else {
        "a data value"
    }
}

fn object_value(object: Option<&EObjectRef>) -> Value {
    object.map_or(Value::Null, |o| Value::Object(o.clone()))
}

impl EObject for DynamicEObject {
    fn e_class(&self) -> Arc<EClass> {
        self.class.clone()
    }

    fn e_get(&self, feature_id: usize) -> Value {
        let Some(feature) = self.class.feature(feature_id) else {
            return Value::Null;
        };
        if feature.is_container() {
            return match self.container_pair() {
                Some((container, containment_id))
                    if self.container_feature_for(&container, containment_id) == Some(feature_id) =>
                {
                    Value::Object(container)
                }
                _ => Value::Null,
            };
        }
        self.slot(feature_id).unwrap_or_else(|| feature.default_value())
    }

    fn e_is_set(&self, feature_id: usize) -> bool {
        let Some(feature) = self.class.feature(feature_id) else {
            return false;
        };
        if feature.is_container() {
            return !self.e_get(feature_id).is_null();
        }
        match self.slot(feature_id) {
            Some(Value::List(items)) => !items.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    fn e_set(&self, feature_id: usize, value: Value) -> Result<(), ModelError> {
        let feature = self.feature(feature_id)?;
        let Some(me) = self.handle() else {
            return Ok(());
        };
        let mut chain = NotificationChain::new();

        if feature.is_container() {
            let new = Self::checked_single(&feature, value)?;
            self.set_container(&me, &feature, new.as_object().cloned(), &mut chain)?;
        } else if feature.is_many() {
            let new = Self::checked_list(&feature, value)?;
            let old = self.list(feature_id);
            if feature.is_reference() {
                for item in &old {
                    if let Value::Object(obj) = item {
                        if !new.iter().any(|v| v.holds(obj)) {
                            self.unlink(&me, &feature, feature_id, obj, &mut chain);
                        }
                    }
                }
                for item in &new {
                    if let Value::Object(obj) = item {
                        if !old.iter().any(|v| v.holds(obj)) {
                            self.link(&me, &feature, feature_id, obj, &mut chain);
                        }
                    }
                }
            }
            self.store(feature_id, Some(Value::List(new.clone())));
            chain.add(Notification::new(
                me,
                EventType::Set,
                feature_id,
                Value::List(old),
                Value::List(new),
            ));
        } else {
            let new = Self::checked_single(&feature, value)?;
            let old = self.e_get(feature_id);
            if feature.is_reference() {
                let unchanged = matches!(
                    (&old, &new),
                    (Value::Object(a), Value::Object(b)) if same_object(a, b)
                );
                if !unchanged {
                    if let Value::Object(obj) = &old {
                        self.unlink(&me, &feature, feature_id, obj, &mut chain);
                    }
                    if let Value::Object(obj) = &new {
                        self.link(&me, &feature, feature_id, obj, &mut chain);
                    }
                }
            }
            self.store(feature_id, Some(new.clone()));
            chain.add(Notification::new(me, EventType::Set, feature_id, old, new));
        }

        chain.dispatch();
        Ok(())
    }

    fn e_unset(&self, feature_id: usize) -> Result<(), ModelError> {
        let feature = self.feature(feature_id)?;
        let Some(me) = self.handle() else {
            return Ok(());
        };
        let mut chain = NotificationChain::new();
        if feature.is_container() {
            self.set_container(&me, &feature, None, &mut chain)?;
        } else {
            let old = self.e_get(feature_id);
            if feature.is_reference() {
                for obj in old.objects() {
                    self.unlink(&me, &feature, feature_id, &obj, &mut chain);
                }
            }
            self.store(feature_id, None);
            chain.add(Notification::new(
                me,
                EventType::Unset,
                feature_id,
                old,
                feature.default_value(),
            ));
        }
        chain.dispatch();
        Ok(())
    }

    fn e_insert(&self, feature_id: usize, index: usize, value: Value) -> Result<(), ModelError> {
        let feature = self.feature(feature_id)?;
        if !feature.is_many() {
            return Err(ModelError::NotMany {
                feature: feature.name().to_owned(),
            });
        }
        let value = Self::checked_element(&feature, value)?;
        let len = self.list(feature_id).len();
        if index > len {
            return Err(ModelError::IndexOutOfBounds {
                feature: feature.name().to_owned(),
                index,
                len,
            });
        }
        if let Value::Object(obj) = &value {
            if self.list(feature_id).iter().any(|v| v.holds(obj)) {
                return Ok(());
            }
        }
        let Some(me) = self.handle() else {
            return Ok(());
        };

        let mut chain = NotificationChain::new();
        if let Value::Object(obj) = &value {
            self.link(&me, &feature, feature_id, obj, &mut chain);
        }
        let mut items = self.list(feature_id);
        let position = index.min(items.len());
        items.insert(position, value.clone());
        self.store(feature_id, Some(Value::List(items)));
        chain.add(
            Notification::new(me, EventType::Add, feature_id, Value::Null, value)
                .with_position(position),
        );
        chain.dispatch();
        Ok(())
    }

    fn e_remove_at(&self, feature_id: usize, index: usize) -> Result<Value, ModelError> {
        let feature = self.feature(feature_id)?;
        if !feature.is_many() {
            return Err(ModelError::NotMany {
                feature: feature.name().to_owned(),
            });
        }
        let mut items = self.list(feature_id);
        if index >= items.len() {
            return Err(ModelError::IndexOutOfBounds {
                feature: feature.name().to_owned(),
                index,
                len: items.len(),
            });
        }
        let removed = items.remove(index);
        self.store(feature_id, Some(Value::List(items)));
        let Some(me) = self.handle() else {
            return Ok(removed);
        };

        let mut chain = NotificationChain::new();
        if let Value::Object(obj) = &removed {
            self.unlink(&me, &feature, feature_id, obj, &mut chain);
        }
        chain.add(
            Notification::new(me, EventType::Remove, feature_id, removed.clone(), Value::Null)
                .with_position(index),
        );
        chain.dispatch();
        Ok(removed)
    }

    fn e_move(&self, feature_id: usize, from: usize, to: usize) -> Result<Value, ModelError> {
        let feature = self.feature(feature_id)?;
        if !feature.is_many() {
            return Err(ModelError::NotMany {
                feature: feature.name().to_owned(),
            });
        }
        let mut items = self.list(feature_id);
        let len = items.len();
        if let Some(index) = [from, to].into_iter().find(|&i| i >= len) {
            return Err(ModelError::IndexOutOfBounds {
                feature: feature.name().to_owned(),
                index,
                len,
            });
        }
        let moved = items.remove(from);
        items.insert(to, moved.clone());
        self.store(feature_id, Some(Value::List(items)));
        if let Some(me) = self.handle() {
            let from = Value::Int(from as i64);
            Notification::new(me, EventType::Move, feature_id, from, moved.clone())
                .with_position(to)
                .dispatch();
        }
        Ok(moved)
    }

    fn e_get_resolved(
        &self,
        feature_id: usize,
        resolver: &dyn Fn(&EObjectRef) -> Option<EObjectRef>,
    ) -> Value {
        let value = self.e_get(feature_id);
        let resolving = self
            .class
            .feature(feature_id)
            .is_some_and(|f| f.resolves_proxies() && !f.is_container());
        let Some(me) = self.handle().filter(|_| resolving) else {
            return value;
        };
        let resolve = |proxy: &EObjectRef| {
            if !proxy.e_is_proxy() {
                return None;
            }
            resolver(proxy).filter(|found| !same_object(found, proxy))
        };

        match value {
            Value::Object(proxy) => match resolve(&proxy) {
                Some(found) => {
                    self.store(feature_id, Some(Value::Object(found.clone())));
                    Notification::new(
                        me,
                        EventType::Resolve,
                        feature_id,
                        Value::Object(proxy),
                        Value::Object(found.clone()),
                    )
                    .dispatch();
                    Value::Object(found)
                }
                None => Value::Object(proxy),
            },
            Value::List(mut items) => {
                let mut resolved = Vec::new();
                for (position, item) in items.iter_mut().enumerate() {
                    let hit = match &*item {
                        Value::Object(proxy) => resolve(proxy).map(|found| (proxy.clone(), found)),
                        _ => None,
                    };
                    if let Some((proxy, found)) = hit {
                        resolved.push((position, proxy, found.clone()));
                        *item = Value::Object(found);
                    }
                }
                if !resolved.is_empty() {
                    self.store(feature_id, Some(Value::List(items.clone())));
                    for (position, proxy, found) in resolved {
                        Notification::new(
                            me.clone(),
                            EventType::Resolve,
                            feature_id,
                            Value::Object(proxy),
                            Value::Object(found),
                        )
                        .with_position(position)
                        .dispatch();
                    }
                }
                Value::List(items)
            }
            other => other,
        }
    }

    fn e_container(&self) -> Option<EObjectRef> {
        self.container_pair().map(|(container, _)| container)
    }

    fn e_container_feature_id(&self) -> Option<usize> {
        self.container_pair().map(|(_, feature_id)| feature_id)
    }

    fn e_basic_set_container(
        &self,
        container: Option<(&EObjectRef, usize)>,
        chain: &mut NotificationChain,
    ) {
        let old = self.container_pair();
        *self.container.borrow_mut() = container.map(|(c, id)| (Rc::downgrade(c), id));
        let unchanged = match (&old, container) {
            (None, None) => true,
            (Some((a, a_id)), Some((b, b_id))) => same_object(a, b) && *a_id == b_id,
            _ => false,
        };
        let Some(me) = self.handle().filter(|_| !unchanged) else {
            return;
        };

        let old_feature = old.as_ref().and_then(|(c, id)| self.container_feature_for(c, *id));
        let new_feature = container.and_then(|(c, id)| self.container_feature_for(c, id));
        let old_value = object_value(old.as_ref().map(|(c, _)| c));
        let new_value = object_value(container.map(|(c, _)| c));
        match (old_feature, new_feature) {
            (Some(a), Some(b)) if a == b => {
                chain.add(Notification::new(me, EventType::Set, a, old_value, new_value));
            }
            (a, b) => {
                if let Some(a) = a {
                    let unset = Value::Null;
                    chain.add(Notification::new(me.clone(), EventType::Set, a, old_value, unset));
                }
                if let Some(b) = b {
                    chain.add(Notification::new(me, EventType::Set, b, Value::Null, new_value));
                }
            }
        }
    }

    fn e_inverse_add(&self, other: &EObjectRef, feature_id: usize, chain: &mut NotificationChain) {
        let Ok(feature) = self.feature(feature_id) else {
            return;
        };
        let Some(me) = self.handle() else {
            return;
        };

        if feature.is_container() {
            let Some(containment_id) = Self::opposite_id(&feature, other) else {
                return;
            };
            if let Some((previous, previous_id)) = self.container_pair() {
                if same_object(&previous, other) && previous_id == containment_id {
                    return;
                }
                previous.e_inverse_remove(&me, previous_id, chain);
            }
            self.e_basic_set_container(Some((other, containment_id)), chain);
        } else if feature.is_many() {
            let mut items = self.list(feature_id);
            if items.iter().any(|v| v.holds(other)) {
                return;
            }
            let position = items.len();
            items.push(Value::Object(other.clone()));
            self.store(feature_id, Some(Value::List(items)));
            let added = Value::Object(other.clone());
            chain.add(
                Notification::new(me, EventType::Add, feature_id, Value::Null, added)
                    .with_position(position),
            );
        } else {
            let old = self.e_get(feature_id);
            if old.holds(other) {
                return;
            }
            if let Value::Object(displaced) = &old {
                if feature.is_containment() {
                    displaced.e_basic_set_container(None, chain);
                } else if let Some(opposite) = Self::opposite_id(&feature, displaced) {
                    displaced.e_inverse_remove(&me, opposite, chain);
                }
            }
            self.store(feature_id, Some(Value::Object(other.clone())));
            chain.add(Notification::new(
                me,
                EventType::Set,
                feature_id,
                old,
                Value::Object(other.clone()),
            ));
        }
    }

    fn e_inverse_remove(
        &self,
        other: &EObjectRef,
        feature_id: usize,
        chain: &mut NotificationChain,
    ) {
        let Ok(feature) = self.feature(feature_id) else {
            return;
        };
        let Some(me) = self.handle() else {
            return;
        };

        if feature.is_container() {
            if self.e_container().is_some_and(|c| same_object(&c, other)) {
                self.e_basic_set_container(None, chain);
            }
        } else if feature.is_many() {
            let mut items = self.list(feature_id);
            let Some(position) = items.iter().position(|v| v.holds(other)) else {
                return;
            };
            let removed = items.remove(position);
            self.store(feature_id, Some(Value::List(items)));
            chain.add(
                Notification::new(me, EventType::Remove, feature_id, removed, Value::Null)
                    .with_position(position),
            );
        } else if self.e_get(feature_id).holds(other) {
            self.store(feature_id, None);
            chain.add(Notification::new(
                me,
                EventType::Set,
                feature_id,
                Value::Object(other.clone()),
                Value::Null,
            ));
        }
    }

    fn e_direct_resource(&self) -> Option<Rc<Resource>> {
        self.resource.borrow().upgrade()
    }

    fn e_set_direct_resource(&self, resource: Option<&Rc<Resource>>) {
        *self.resource.borrow_mut() = resource.map(Rc::downgrade).unwrap_or_default();
    }

    fn e_proxy_uri(&self) -> Option<String> {
        self.proxy_uri.borrow().clone()
    }

    fn e_set_proxy_uri(&self, uri: Option<String>) {
        *self.proxy_uri.borrow_mut() = uri;
    }

    fn e_adapters(&self) -> Vec<AdapterRef> {
        self.adapters.borrow().clone()
    }

    fn e_add_adapter(&self, adapter: AdapterRef) {
        self.adapters.borrow_mut().push(adapter.clone());
        if let Some(me) = self.handle() {
            adapter.set_target(&me);
        }
    }

    fn e_remove_adapter(&self, adapter: &AdapterRef) -> bool {
        let removed = {
            let mut adapters = self.adapters.borrow_mut();
            match adapters.iter().position(|a| same_adapter(a, adapter)) {
                Some(index) => Some(adapters.remove(index)),
                None => None,
            }
        };
        let Some(removed) = removed else {
            return false;
        };
        if let Some(me) = self.handle() {
            removed.unset_target(&me);
        }
        true
    }

    fn e_deliver(&self) -> bool {
        self.deliver.get()
    }

    fn e_set_deliver(&self, deliver: bool) {
        self.deliver.set(deliver);
    }

    fn e_notify(&self, notification: &Notification) {
        if !self.deliver.get() {
            return;
        }
        let adapters = self.adapters.borrow().clone();
        for adapter in adapters {
            adapter.notify_changed(notification);
        }
    }
}

impl fmt::Debug for DynamicEObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.class.name());
        if let Some(uri) = self.proxy_uri.borrow().as_ref() {
            s.field("proxy", uri);
        }
        for (feature, slot) in self.class.features().iter().zip(self.slots.borrow().iter()) {
            if let Some(Value::Object(_) | Value::List(_)) = slot {
                if feature.is_reference() {
                    s.field(feature.name(), &"..");
                    continue;
                }
            }
            if let Some(value) = slot {
                s.field(feature.name(), value);
            }
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{EClassBuilder, EPackage, EPackageBuilder, FeatureSpec};
    use crate::notify::NotificationRecorder;

    fn package() -> Arc<EPackage> {
        EPackageBuilder::new("tree", "urn:dynamic-object-test")
            .class(
                EClassBuilder::new("Node")
                    .attribute("label", "EString")
                    .attribute("weight", "EInt")
                    .feature(FeatureSpec::reference("children").containment().many())
                    .feature(FeatureSpec::reference("parent").container("children"))
                    .feature(FeatureSpec::reference("peer").opposite("peer"))
                    .feature(FeatureSpec::attribute("tags", "EString").many()),
            )
            .build()
            .unwrap()
    }

    fn node(package: &Arc<EPackage>) -> EObjectRef {
        DynamicEObject::new(package.class("Node").unwrap().clone())
    }

    const LABEL: usize = 0;
    const WEIGHT: usize = 1;
    const CHILDREN: usize = 2;
    const PARENT: usize = 3;
    const PEER: usize = 4;
    const TAGS: usize = 5;

    #[test]
    fn unset_features_report_defaults() {
        let package = package();
        let n = node(&package);
        assert_eq!(n.e_get(WEIGHT), Value::Int(0));
        assert!(!n.e_is_set(WEIGHT));
        n.e_set(WEIGHT, Value::Int(3)).unwrap();
        assert!(n.e_is_set(WEIGHT));
        n.e_unset(WEIGHT).unwrap();
        assert_eq!(n.e_get(WEIGHT), Value::Int(0));
        assert_eq!(n.e_get(TAGS), Value::List(vec![]));
    }

    #[test]
    fn type_checks() {
        let package = package();
        let n = node(&package);
        assert!(matches!(
            n.e_set(LABEL, Value::List(vec![])),
            Err(ModelError::InvalidValue { .. })
        ));
        assert!(matches!(n.e_set(99, Value::Null), Err(ModelError::NoSuchFeature { .. })));
        assert!(matches!(n.e_add(LABEL, Value::from("x")), Err(ModelError::NotMany { .. })));
        assert!(matches!(
            n.e_insert(TAGS, 2, Value::from("x")),
            Err(ModelError::IndexOutOfBounds { index: 2, len: 0, .. })
        ));
        assert!(matches!(
            n.e_set(PEER, Value::from("x")),
            Err(ModelError::InvalidValue { .. })
        ));
    }

    #[test]
    fn containment_sets_container() {
        let package = package();
        let root = node(&package);
        let child = node(&package);
        root.e_add(CHILDREN, Value::from(&child)).unwrap();
        assert!(same_object(&child.e_container().unwrap(), &root));
        assert_eq!(child.e_container_feature_id(), Some(CHILDREN));
        assert!(child.e_get(PARENT).holds(&root));

        // Adding twice keeps the list unique.
        root.e_add(CHILDREN, Value::from(&child)).unwrap();
        assert_eq!(root.e_get(CHILDREN).as_list().unwrap().len(), 1);

        root.e_remove_at(CHILDREN, 0).unwrap();
        assert!(child.e_container().is_none());
        assert!(child.e_get(PARENT).is_null());
    }

    #[test]
    fn setting_the_container_feature_moves_the_child() {
        let package = package();
        let a = node(&package);
        let b = node(&package);
        let child = node(&package);
        child.e_set(PARENT, Value::from(&a)).unwrap();
        assert!(a.e_get(CHILDREN).holds(&child));

        let recorder = NotificationRecorder::new();
        child.e_add_adapter(recorder.clone());
        a.e_add_adapter(recorder.clone());
        b.e_add_adapter(recorder.clone());

        child.e_set(PARENT, Value::from(&b)).unwrap();
        assert!(!a.e_get(CHILDREN).holds(&child));
        assert!(b.e_get(CHILDREN).holds(&child));

        let events: Vec<_> = recorder
            .take()
            .into_iter()
            .map(|n| (n.event_type(), n.feature_id()))
            .collect();
        assert_eq!(
            events,
            vec![
                (EventType::Remove, Some(CHILDREN)),
                (EventType::Add, Some(CHILDREN)),
                (EventType::Set, Some(PARENT)),
            ]
        );
    }

    #[test]
    fn bidirectional_references_stay_in_sync() {
        let package = package();
        let a = node(&package);
        let b = node(&package);
        let c = node(&package);
        a.e_set(PEER, Value::from(&b)).unwrap();
        assert!(b.e_get(PEER).holds(&a));

        // c steals b; a loses its peer.
        c.e_set(PEER, Value::from(&b)).unwrap();
        assert!(b.e_get(PEER).holds(&c));
        assert!(a.e_get(PEER).is_null());

        c.e_unset(PEER).unwrap();
        assert!(b.e_get(PEER).is_null());
    }

    #[test]
    fn move_reports_old_index() {
        let package = package();
        let n = node(&package);
        n.e_set(TAGS, Value::from(vec!["a", "b", "c"])).unwrap();
        let recorder = NotificationRecorder::new();
        n.e_add_adapter(recorder.clone());
        assert_eq!(n.e_move(TAGS, 0, 2).unwrap(), Value::from("a"));
        assert_eq!(n.e_get(TAGS), Value::from(vec!["b", "c", "a"]));
        let events = recorder.take();
        assert_eq!(events[0].event_type(), EventType::Move);
        assert_eq!(events[0].old_value(), &Value::Int(0));
        assert_eq!(events[0].position(), Some(2));
    }

    #[test]
    fn delivery_can_be_switched_off() {
        let package = package();
        let n = node(&package);
        let recorder = NotificationRecorder::new();
        n.e_add_adapter(recorder.clone());
        n.e_set_deliver(false);
        n.e_set(LABEL, Value::from("quiet")).unwrap();
        assert!(recorder.is_empty());
        n.e_set_deliver(true);
        n.e_set(LABEL, Value::from("loud")).unwrap();
        assert_eq!(recorder.len(), 1);
        let adapter: AdapterRef = recorder.clone();
        assert!(n.e_remove_adapter(&adapter));
        assert!(!n.e_remove_adapter(&adapter));
    }
}
