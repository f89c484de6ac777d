//! Core building blocks for the folio catalog service: layered settings,
//! the [`Module`] trait, and the [`ModuleRegistry`] lifecycle.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
