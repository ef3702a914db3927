//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. An
/// [`Amount`](crate::Amount) of `50.00` equals any other `50.00`; a customer
/// with the same name as another is still a different customer.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
