//! Object identifiers managed outside the object graph.

use std::collections::HashMap;
use std::fmt;

use ecore_pack::PackValue;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

use crate::object::{object_key, EObjectRef};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Str(String),
    Uuid(Uuid),
    Ulid(Ulid),
}

impl ObjectId {
    /// Primitive value written to a binary stream.
    pub fn to_pack(&self) -> PackValue {
        match self {
            ObjectId::Str(s) => PackValue::Str(s.clone()),
            ObjectId::Uuid(uuid) => PackValue::Uuid(*uuid),
            ObjectId::Ulid(ulid) => PackValue::Ulid(*ulid),
        }
    }

    pub fn from_pack(value: PackValue) -> Option<Self> {
        match value {
            PackValue::Str(s) => Some(ObjectId::Str(s)),
            PackValue::Uuid(uuid) => Some(ObjectId::Uuid(uuid)),
            PackValue::Ulid(ulid) => Some(ObjectId::Ulid(ulid)),
            _ => None,
        }
    }

    /// Candidate IDs whose display form is `text`, most specific first.
    pub(crate) fn candidates(text: &str) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(2);
        if let Ok(uuid) = Uuid::parse_str(text) {
            out.push(ObjectId::Uuid(uuid));
        } else if let Ok(ulid) = Ulid::from_string(text) {
            out.push(ObjectId::Ulid(ulid));
        }
        out.push(ObjectId::Str(text.to_owned()));
        out
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Str(s) => f.write_str(s),
            ObjectId::Uuid(uuid) => write!(f, "{uuid}"),
            ObjectId::Ulid(ulid) => write!(f, "{ulid}"),
        }
    }
}

/// Kind of identifier an [`IdManager`] hands out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Uuid,
    Ulid,
}

/// Bidirectional object ↔ identifier mapping for one resource.
pub trait ObjectIdManager {
    fn get_id(&self, object: &EObjectRef) -> Option<ObjectId>;
    fn get_object(&self, id: &ObjectId) -> Option<EObjectRef>;
    /// Binds `id` to `object`, replacing any previous binding of either.
    fn set_id(&mut self, object: &EObjectRef, id: ObjectId);
    /// The object's ID, generating one first if it has none.
    fn register(&mut self, object: &EObjectRef) -> ObjectId;
    fn release(&mut self, object: &EObjectRef) -> Option<ObjectId>;
}

#[derive(Default)]
pub struct IdManager {
    strategy: IdStrategy,
    by_object: HashMap<usize, (EObjectRef, ObjectId)>,
    by_id: HashMap<ObjectId, EObjectRef>,
}

impl IdManager {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn generate(&self) -> ObjectId {
        match self.strategy {
            IdStrategy::Uuid => ObjectId::Uuid(Uuid::new_v4()),
            IdStrategy::Ulid => ObjectId::Ulid(Ulid::new()),
        }
    }
}

impl ObjectIdManager for IdManager {
    fn get_id(&self, object: &EObjectRef) -> Option<ObjectId> {
        self.by_object.get(&object_key(object)).map(|(_, id)| id.clone())
    }

    fn get_object(&self, id: &ObjectId) -> Option<EObjectRef> {
        self.by_id.get(id).cloned()
    }

    fn set_id(&mut self, object: &EObjectRef, id: ObjectId) {
        self.release(object);
        if let Some(previous) = self.by_id.remove(&id) {
            self.by_object.remove(&object_key(&previous));
        }
        self.by_object
            .insert(object_key(object), (object.clone(), id.clone()));
        self.by_id.insert(id, object.clone());
    }

    fn register(&mut self, object: &EObjectRef) -> ObjectId {
        if let Some(id) = self.get_id(object) {
            return id;
        }
        let id = self.generate();
        self.set_id(object, id.clone());
        id
    }

    fn release(&mut self, object: &EObjectRef) -> Option<ObjectId> {
        let (_, id) = self.by_object.remove(&object_key(object))?;
        self.by_id.remove(&id);
        Some(id)
    }
}
