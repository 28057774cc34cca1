//! Metamodel: the classes, features and data types that describe modeled
//! objects, the factories that instantiate them and the registry that finds
//! packages by namespace URI.

mod builder;
mod class;
mod data_type;
mod error;
mod factory;
mod feature;
mod package;
mod registry;

pub use builder::{EClassBuilder, EPackageBuilder, FeatureSpec};
pub use class::EClass;
pub use data_type::{ecore_data_type, ecore_data_types, EDataType, NativeType};
pub use error::{ConversionError, MetamodelError};
pub use factory::{DynamicFactory, EFactory};
pub use feature::{EStructuralFeature, FeatureKind};
pub use package::EPackage;
pub use registry::PackageRegistry;
