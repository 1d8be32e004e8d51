//! Grocery domain logic: units, name normalization, duplicate detection,
//! staple schedules, meal-plan aggregation and category suggestion.

pub mod aggregate;
pub mod categories;
pub mod dedup;
pub mod normalize;
pub mod staples;
pub mod units;
