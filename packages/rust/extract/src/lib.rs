//! Structured extraction of documentation pages.
//!
//! This crate provides:
//! - [`layouts`]: site layouts (GitBook, generic) and their selector sets
//! - [`associate`]: attributes prose, links and tables to their heading
//! - [`PageExtractor`] / [`build`]: assembles one [`PageTree`] per page
//!
//! [`PageTree`]: docdistill_shared::PageTree

pub mod associate;
pub mod builder;
pub mod layouts;
pub mod tables;
pub mod text;

pub use associate::{Association, ScopeContent, associate};
pub use builder::{PageExtractor, build};
pub use layouts::{
    GenericLayout, GitBookLayout, LayoutPreset, LayoutRegistry, LayoutSelectors, SiteLayout,
};
