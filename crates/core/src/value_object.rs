//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// with the same values are the same value. Tax rate sets and computed totals
/// are the canonical examples in this workspace.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
