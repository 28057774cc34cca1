//! Reflective object models with fine-grained change notification and a
//! compact binary codec.
//!
//! - [`metamodel`]: packages, classes, features and data types describing
//!   the shape of modeled objects, plus factories and the package registry.
//! - [`object`]: the [`EObject`](object::EObject) capability trait and the
//!   reflective [`DynamicEObject`](object::DynamicEObject).
//! - [`notify`]: notifications, notification chains and adapters.
//! - [`resource`]: resources, resource sets, URI fragments and object IDs.
//! - [`binary`]: the binary model encoder/decoder built on `ecore-pack`.

pub mod binary;
pub mod metamodel;
pub mod notify;
pub mod object;
pub mod resource;
mod value;

pub use value::Value;

pub use binary::{
    BinaryDecoder, BinaryEncoder, BinaryError, BinaryFeatureKind, DecodeOptions, EncodeOptions,
    ErrorKind,
};
pub use metamodel::{
    DynamicFactory, EClass, EClassBuilder, EDataType, EFactory, EPackage, EPackageBuilder,
    EStructuralFeature, FeatureKind, MetamodelError, NativeType, PackageRegistry,
};
pub use notify::{
    Adapter, AdapterRef, ChainAdd, ContentAdapter, EventType, FeatureRef, Notification,
    NotificationChain, NotificationRecorder,
};
pub use object::{DynamicEObject, EObject, EObjectRef, ModelError};
pub use resource::{IdManager, IdStrategy, ObjectId, ObjectIdManager, Resource, ResourceSet};
