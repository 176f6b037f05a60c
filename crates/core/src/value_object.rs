//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A `Username`
/// carried in a token is one: two tokens naming the same user refer to the
/// same identity regardless of when they were issued.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
