//! Type model for API schemas.
//!
//! A [`TypeDescriptor`] describes the structure of a value. Composite
//! descriptors (enums and objects) are interned in a [`TypesStore`] so that
//! documents hold each type once and refer to it by [`ReferenceKey`].

mod context;
mod descriptor;
mod name;
mod primitive;
mod property;
mod store;

pub use context::Context;
pub use descriptor::{RootKind, TypeDescriptor};
pub use name::TypeName;
pub use primitive::PrimitiveType;
pub use property::{EnumCase, Necessity, TypeProperty};
pub use store::{ReferenceKey, TypesStore};
