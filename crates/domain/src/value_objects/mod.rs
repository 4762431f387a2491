//! Value objects - Immutable objects defined by their attributes

mod attribute_path;
mod diff;
mod quantity;
mod settings;

pub use attribute_path::{number_value, AttributePath};
pub use diff::{merge_object, shallow_diff};
pub use quantity::{clamp_subtract, QuantityChange};
pub use settings::{split_list, DynamicAttribute, ItemSchema, ModuleSettings};
