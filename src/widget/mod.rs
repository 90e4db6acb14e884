mod kind;
mod tree;
mod value;

pub use kind::{ValueType, WidgetKind, WidgetKindInfo};
pub use tree::{Widget, WidgetId, WidgetSpec, WidgetTree};
pub use value::WidgetValue;
