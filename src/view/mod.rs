//! UI-independent view state: the query form and the selection view.

pub mod form;
pub mod selection;

pub use form::{CoordinateMode, FormField, QueryForm};
pub use selection::{SelectionSet, SelectionView, StatusFilter};
