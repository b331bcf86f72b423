//! # compdeps-client
//!
//! The client-side half of compdeps: executes loader payloads against a
//! [`Document`], inserting each dependency at most once and initializing
//! component instances after their scripts load.
//!
//! ## Modules
//!
//! - [`loader`] - [`Loader`], load handles, and component initialization
//! - [`loaded`] - The [`LoadedSet`] of resources already on the page
//! - [`document`] - The [`Document`] trait and [`LoadError`]
//! - [`markup`] - Parsing `<script>`/`<link>` markup into [`TagMarkup`]

pub mod document;
pub mod loaded;
pub mod loader;
pub mod markup;

pub use document::{Document, LoadError};
pub use loaded::{LoadedSet, MemoryLoadedSet};
pub use loader::{
    CallOutcome, CallRecord, ComponentContext, DataFactory, ExecutionReport, Initializer,
    LoadHandle, Loader,
};
pub use markup::{TagMarkup, TagParseError};
