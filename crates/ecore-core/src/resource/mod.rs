//! Resources: ordered collections of root objects addressable by URI, and
//! the resource sets that resolve URIs across them.

mod fragment;
mod id_manager;
mod resource_set;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub use id_manager::{IdManager, IdStrategy, ObjectId, ObjectIdManager};
pub use resource_set::ResourceSet;

use crate::binary::{BinaryDecoder, BinaryEncoder, BinaryError, DecodeOptions, EncodeOptions};
use crate::object::{same_object, EObjectRef};

pub struct Resource {
    this: Weak<Resource>,
    uri: String,
    contents: RefCell<Vec<EObjectRef>>,
    id_manager: RefCell<Option<Box<dyn ObjectIdManager>>>,
}

impl Resource {
    pub fn new(uri: impl Into<String>) -> Rc<Resource> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            uri: uri.into(),
            contents: RefCell::new(Vec::new()),
            id_manager: RefCell::new(None),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Root objects, in order.
    pub fn contents(&self) -> Vec<EObjectRef> {
        self.contents.borrow().clone()
    }

    /// Appends `object` as a root; it is ignored if it already is one.
    pub fn add(&self, object: EObjectRef) {
        if self.contents.borrow().iter().any(|o| same_object(o, &object)) {
            return;
        }
        if let Some(me) = self.this.upgrade() {
            object.e_set_direct_resource(Some(&me));
        }
        self.contents.borrow_mut().push(object);
    }

    pub fn remove(&self, object: &EObjectRef) -> bool {
        let removed = {
            let mut contents = self.contents.borrow_mut();
            let position = contents.iter().position(|o| same_object(o, object));
            position.map(|index| contents.remove(index))
        };
        match removed {
            Some(object) => {
                object.e_set_direct_resource(None);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        for object in self.contents.take() {
            object.e_set_direct_resource(None);
        }
    }

    pub fn set_id_manager(&self, manager: impl ObjectIdManager + 'static) {
        *self.id_manager.borrow_mut() = Some(Box::new(manager));
    }

    pub fn has_id_manager(&self) -> bool {
        self.id_manager.borrow().is_some()
    }

    /// Runs `f` against the ID manager, if the resource has one.
    pub fn with_id_manager<R>(&self, f: impl FnOnce(&mut dyn ObjectIdManager) -> R) -> Option<R> {
        let mut manager = self.id_manager.borrow_mut();
        manager.as_mut().map(|m| f(m.as_mut()))
    }

    pub fn object_id(&self, object: &EObjectRef) -> Option<ObjectId> {
        self.with_id_manager(|m| m.get_id(object)).flatten()
    }

    /// Fragment addressing `object` in this resource: its ID when it has one,
    /// otherwise its containment path.
    pub fn uri_fragment(&self, object: &EObjectRef) -> Option<String> {
        if let Some(id) = self.object_id(object) {
            return Some(id.to_string());
        }
        fragment::path_fragment(&self.contents.borrow(), object)
    }

    /// `uri#fragment` of `object`.
    pub fn object_uri(&self, object: &EObjectRef) -> Option<String> {
        self.uri_fragment(object)
            .map(|fragment| format!("{}#{fragment}", self.uri))
    }

    /// Finds the object addressed by `fragment`: a containment path when it
    /// starts with `/`, otherwise an object ID.
    pub fn get_eobject(&self, fragment: &str) -> Option<EObjectRef> {
        if fragment.starts_with('/') {
            let contents = self.contents.borrow();
            return fragment::resolve_path(&contents, fragment);
        }
        self.with_id_manager(|m| {
            ObjectId::candidates(fragment)
                .iter()
                .find_map(|id| m.get_object(id))
        })
        .flatten()
    }

    /// Encodes the contents to the binary format.
    pub fn save(&self, options: &EncodeOptions) -> Result<Vec<u8>, BinaryError> {
        BinaryEncoder::new(options.clone()).encode_resource(self)
    }

    /// Replaces the contents with the objects decoded from `bytes`. On error
    /// the resource is left untouched.
    pub fn load(
        &self,
        bytes: &[u8],
        options: &DecodeOptions,
        resource_set: Option<&ResourceSet>,
    ) -> Result<(), BinaryError> {
        let mut decoder = BinaryDecoder::new(options.clone());
        if let Some(resource_set) = resource_set {
            decoder = decoder.with_resource_set(resource_set);
        }
        decoder.decode_resource(self, bytes)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.uri)
            .field("roots", &self.contents.borrow().len())
            .finish()
    }
}
