//! Build-time web component expansion.
//!
//! Components are HTML template files named after their custom element tag
//! (the stem must contain a hyphen). Page markup references them like any
//! other element; expansion replaces each usage with its template, filling
//! `<slot>` placeholders from the usage's inner markup.

pub mod expand;
pub mod registry;
pub mod slots;

pub use expand::{ExpandError, Expander};
pub use registry::{ComponentRegistry, ComponentTemplate};
pub use slots::{extract_slots, fill_slots, SlotMap};
