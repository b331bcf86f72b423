//! The seam between the loader and the page it manipulates.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::markup::TagMarkup;

/// Why a dependency did not load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The element fired its error event.
    #[error("failed to load '{id}': {reason}")]
    Failed {
        /// Resource id.
        id: String,
        /// What the document reported.
        reason: String,
    },
    /// The element was dropped before it settled, or was never requested.
    #[error("load of '{0}' was abandoned")]
    Abandoned(String),
}

/// A page the loader can insert elements into.
///
/// Browsers, headless documents, and test doubles implement this.
pub trait Document: Send + Sync + 'static {
    /// A handle to one element of the page.
    type Element: Clone + Send + 'static;

    /// Inserts an element equivalent to `tag`, with all of its attributes.
    ///
    /// The insertion itself happens before this returns. The future settles
    /// once the element fires its load or error event.
    fn insert(&self, tag: &TagMarkup) -> BoxFuture<'static, Result<(), LoadError>>;

    /// The elements rendered for one component instance.
    fn elements_for_instance(&self, instance_id: &str) -> Vec<Self::Element>;
}
