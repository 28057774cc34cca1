use std::fmt;
use std::sync::Arc;

use crate::metamodel::EStructuralFeature;
use crate::object::{same_object, EObjectRef};
use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Set,
    Unset,
    Add,
    AddMany,
    Remove,
    RemoveMany,
    /// A proxy was replaced by the object it stands for.
    Resolve,
    /// An element changed position; the old value is its former index.
    Move,
}

/// Identifies the changed feature, either by ID in the notifier's class or
/// directly.
#[derive(Clone)]
pub enum FeatureRef {
    Id(usize),
    Feature(Arc<EStructuralFeature>),
}

impl From<usize> for FeatureRef {
    fn from(id: usize) -> Self {
        FeatureRef::Id(id)
    }
}

impl From<Arc<EStructuralFeature>> for FeatureRef {
    fn from(feature: Arc<EStructuralFeature>) -> Self {
        FeatureRef::Feature(feature)
    }
}

impl From<&Arc<EStructuralFeature>> for FeatureRef {
    fn from(feature: &Arc<EStructuralFeature>) -> Self {
        FeatureRef::Feature(feature.clone())
    }
}

/// One change to one feature of one object.
#[derive(Clone)]
pub struct Notification {
    notifier: EObjectRef,
    event_type: EventType,
    feature: FeatureRef,
    old_value: Value,
    new_value: Value,
    position: Option<usize>,
}

impl Notification {
    pub fn new(
        notifier: EObjectRef,
        event_type: EventType,
        feature: impl Into<FeatureRef>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self {
            notifier,
            event_type,
            feature: feature.into(),
            old_value,
            new_value,
            position: None,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn notifier(&self) -> &EObjectRef {
        &self.notifier
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    pub fn new_value(&self) -> &Value {
        &self.new_value
    }

    /// List index the change applies to; `None` for single-valued features.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// The changed feature, resolved through the notifier's class when the
    /// notification was built from an ID.
    pub fn feature(&self) -> Option<Arc<EStructuralFeature>> {
        match &self.feature {
            FeatureRef::Id(id) => self.notifier.e_class().feature(*id).cloned(),
            FeatureRef::Feature(feature) => Some(feature.clone()),
        }
    }

    pub fn feature_id(&self) -> Option<usize> {
        match &self.feature {
            FeatureRef::Id(id) => Some(*id),
            FeatureRef::Feature(feature) => self.notifier.e_class().feature_id_of(feature),
        }
    }

    /// Whether the old and new values are the same, e.g. setting a feature to
    /// its current value.
    pub fn is_touch(&self) -> bool {
        match self.event_type {
            EventType::Resolve | EventType::RemoveMany => false,
            EventType::Move => self.old_value.as_i64() == self.position.map(|p| p as i64),
            _ => self.old_value == self.new_value,
        }
    }

    fn same_feature(&self, other: &Notification) -> bool {
        match (&self.feature, &other.feature) {
            (FeatureRef::Id(a), FeatureRef::Id(b)) => a == b,
            (FeatureRef::Feature(a), FeatureRef::Feature(b)) => Arc::ptr_eq(a, b),
            _ => self.feature_id().is_some() && self.feature_id() == other.feature_id(),
        }
    }

    /// Absorbs `other` into this notification when both describe one change.
    ///
    /// - SET/UNSET followed by SET/UNSET keeps the first old value and the
    ///   second new value; the result is a SET if either side was.
    /// - REMOVE followed by REMOVE, or REMOVE_MANY followed by REMOVE, becomes
    ///   a REMOVE_MANY listing removed elements as the old value and their
    ///   original positions, ascending, as the new value.
    ///
    /// Returns `false`, leaving this notification untouched, otherwise.
    pub fn merge(&mut self, other: &Notification) -> bool {
        if !same_object(&self.notifier, &other.notifier) || !self.same_feature(other) {
            return false;
        }
        match (self.event_type, other.event_type) {
            (EventType::Set | EventType::Unset, EventType::Set | EventType::Unset) => {
                self.new_value = other.new_value.clone();
                if other.event_type == EventType::Set {
                    self.event_type = EventType::Set;
                }
                true
            }
            (EventType::Remove, EventType::Remove) => {
                let (Some(first), Some(second)) = (self.position, other.position) else {
                    return false;
                };
                let second = original_position(&[first], second);
                let mut removed = vec![first];
                let mut old_values = vec![std::mem::take(&mut self.old_value)];
                insert_removal(&mut removed, &mut old_values, second, other.old_value.clone());
                self.event_type = EventType::RemoveMany;
                self.old_value = Value::List(old_values);
                self.new_value = positions_value(&removed);
                true
            }
            (EventType::RemoveMany, EventType::Remove) => {
                let Some(position) = other.position else {
                    return false;
                };
                let Some(mut removed) = positions(&self.new_value) else {
                    return false;
                };
                let Value::List(old_values) = &mut self.old_value else {
                    return false;
                };
                if old_values.len() != removed.len() {
                    return false;
                }
                let position = original_position(&removed, position);
                insert_removal(&mut removed, old_values, position, other.old_value.clone());
                self.new_value = positions_value(&removed);
                true
            }
            _ => false,
        }
    }

    /// Whether `other` must be kept as a separate notification next to this
    /// one; `false` means it was merged in.
    pub fn add(&mut self, other: &Notification) -> bool {
        !self.merge(other)
    }

    /// Delivers this notification to its notifier.
    pub fn dispatch(&self) {
        self.notifier.e_notify(self);
    }
}

/// Maps a position observed after `removed` were taken out back to its
/// index in the original list.
fn original_position(removed: &[usize], position: usize) -> usize {
    let mut sorted = removed.to_vec();
    sorted.sort_unstable();
    let mut original = position;
    for r in sorted {
        if r <= original {
            original += 1;
        }
    }
    original
}

/// Records a removal at original `position`, keeping positions ascending.
fn insert_removal(
    positions: &mut Vec<usize>,
    old_values: &mut Vec<Value>,
    position: usize,
    old_value: Value,
) {
    let at = positions.partition_point(|&p| p < position);
    positions.insert(at, position);
    old_values.insert(at, old_value);
}

fn positions(value: &Value) -> Option<Vec<usize>> {
    value
        .as_list()?
        .iter()
        .map(|v| v.as_i64().and_then(|i| usize::try_from(i).ok()))
        .collect()
}

fn positions_value(positions: &[usize]) -> Value {
    Value::List(positions.iter().map(|&p| Value::Int(p as i64)).collect())
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feature = self.feature();
        f.debug_struct("Notification")
            .field("event_type", &self.event_type)
            .field("notifier", &self.notifier.e_class().name())
            .field("feature", &feature.as_ref().map(|f| f.name()))
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .field("position", &self.position)
            .finish()
    }
}
