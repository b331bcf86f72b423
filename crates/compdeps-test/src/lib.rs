//! # compdeps-test
//!
//! Testing utilities for compdeps.
//!
//! ## Modules
//!
//! - [`client`] - [`TestClient`] for driving an Axum router without a socket
//! - [`document`] - [`MemoryDocument`], a recording [`Document`](compdeps_client::Document)
//! - [`fixtures`] - Ready-made registries and pages

pub mod client;
pub mod document;
pub mod fixtures;

pub use client::{TestClient, TestResponse};
pub use document::{InsertedElement, MemoryDocument};
pub use fixtures::{registry_with, sample_registry, sample_settings, SAMPLE_PAGE};
