//! An in-memory [`Document`] that records what the loader inserts.
//!
//! By default every insertion settles at once. In manual mode loads stay
//! pending until the test calls [`MemoryDocument::complete`] or
//! [`MemoryDocument::fail`], which makes ordering observable.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use compdeps_assets::{AssetKind, Attr};
use compdeps_client::{Document, LoadError, TagMarkup};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tokio::sync::oneshot;

/// One element the loader inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedElement {
    /// Script or style.
    pub kind: AssetKind,
    /// The `src`/`href`.
    pub id: String,
    /// Every attribute, in order.
    pub attrs: Vec<Attr>,
}

impl InsertedElement {
    /// The value of an attribute. Flags yield `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }
}

#[derive(Default)]
struct Inner {
    manual: bool,
    inserted: Vec<InsertedElement>,
    pending: HashMap<String, Vec<oneshot::Sender<Result<(), LoadError>>>>,
    failing: HashSet<String>,
    instances: HashMap<String, Vec<String>>,
}

/// A recording document for loader tests.
#[derive(Default)]
pub struct MemoryDocument {
    inner: Mutex<Inner>,
}

impl MemoryDocument {
    /// A document whose loads settle immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A document whose loads stay pending until completed by hand.
    pub fn manual() -> Self {
        let doc = Self::default();
        doc.lock().manual = true;
        doc
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes immediate loads of `id` fail.
    #[must_use]
    pub fn failing(self, id: &str) -> Self {
        self.lock().failing.insert(id.to_string());
        self
    }

    /// Adds an element rendered for `instance_id`.
    #[must_use]
    pub fn with_instance(self, instance_id: &str, element: &str) -> Self {
        self.add_instance(instance_id, element);
        self
    }

    /// Adds an element rendered for `instance_id`.
    pub fn add_instance(&self, instance_id: &str, element: &str) {
        self.lock()
            .instances
            .entry(instance_id.to_string())
            .or_default()
            .push(element.to_string());
    }

    /// Everything inserted so far, in order.
    pub fn inserted(&self) -> Vec<InsertedElement> {
        self.lock().inserted.clone()
    }

    /// The ids inserted so far, in order.
    pub fn inserted_ids(&self) -> Vec<String> {
        self.lock().inserted.iter().map(|e| e.id.clone()).collect()
    }

    /// Ids whose loads are still pending.
    pub fn pending(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Fires the load event for `id`. Returns `false` if nothing was pending.
    pub fn complete(&self, id: &str) -> bool {
        self.settle(id, Ok(()))
    }

    /// Fires the error event for `id`. Returns `false` if nothing was pending.
    pub fn fail(&self, id: &str, reason: &str) -> bool {
        self.settle(
            id,
            Err(LoadError::Failed {
                id: id.to_string(),
                reason: reason.to_string(),
            }),
        )
    }

    fn settle(&self, id: &str, result: Result<(), LoadError>) -> bool {
        let Some(senders) = self.lock().pending.remove(id) else {
            return false;
        };
        for sender in senders {
            // The receiver is gone only if the loader was dropped.
            let _ = sender.send(result.clone());
        }
        true
    }
}

impl Document for MemoryDocument {
    type Element = String;

    fn insert(&self, tag: &TagMarkup) -> BoxFuture<'static, Result<(), LoadError>> {
        let id = tag.resource_id().unwrap_or_default().to_string();
        let mut inner = self.lock();
        inner.inserted.push(InsertedElement {
            kind: tag.kind(),
            id: id.clone(),
            attrs: tag.attrs().to_vec(),
        });

        if !inner.manual {
            let result = if inner.failing.contains(&id) {
                Err(LoadError::Failed {
                    id,
                    reason: "load error".to_string(),
                })
            } else {
                Ok(())
            };
            return future::ready(result).boxed();
        }

        let (tx, rx) = oneshot::channel();
        inner.pending.entry(id.clone()).or_default().push(tx);
        async move { rx.await.unwrap_or_else(|_| Err(LoadError::Abandoned(id))) }.boxed()
    }

    fn elements_for_instance(&self, instance_id: &str) -> Vec<String> {
        self.lock()
            .instances
            .get(instance_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(src: &str) -> TagMarkup {
        TagMarkup::parse(&format!(r#"<script src="{src}" defer></script>"#)).unwrap()
    }

    #[tokio::test]
    async fn test_immediate_mode() {
        let doc = MemoryDocument::new().failing("/bad.js");
        assert!(doc.insert(&script("/a.js")).await.is_ok());
        assert!(doc.insert(&script("/bad.js")).await.is_err());
        assert_eq!(doc.inserted_ids(), vec!["/a.js", "/bad.js"]);
        assert_eq!(doc.inserted()[0].attr("defer"), Some(""));
    }

    #[tokio::test]
    async fn test_manual_mode() {
        let doc = MemoryDocument::manual();
        let load = doc.insert(&script("/a.js"));
        assert_eq!(doc.pending(), vec!["/a.js"]);
        assert!(doc.fail("/a.js", "boom"));
        assert!(!doc.complete("/a.js"));
        assert!(matches!(load.await, Err(LoadError::Failed { .. })));
    }

    #[test]
    fn test_instances() {
        let doc = MemoryDocument::new().with_instance("c1", "<div></div>");
        assert_eq!(doc.elements_for_instance("c1").len(), 1);
        assert!(doc.elements_for_instance("c2").is_empty());
    }
}
