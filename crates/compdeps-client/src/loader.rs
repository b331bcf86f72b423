//! The dependency loader.
//!
//! [`Loader`] is the client half of the system. It executes the payload the
//! rewriter emitted: it records resources the page already has, inserts the
//! ones it lacks (each at most once), and calls component initializers once
//! their scripts have loaded.
//!
//! `load_script` never blocks. It returns a [`LoadHandle`], a shared
//! completion future that any number of waiters may await. Scripts are
//! inserted in request order: each waits for the previous one to settle,
//! whether it loaded or failed. Styles load in parallel.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use compdeps_assets::{AssetKind, Instruction, Payload};
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;

use crate::document::{Document, LoadError};
use crate::loaded::{LoadedSet, MemoryLoadedSet};
use crate::markup::{TagMarkup, TagParseError};

type LoadFuture = Shared<BoxFuture<'static, Result<(), LoadError>>>;

/// Completion of one dependency load.
///
/// Cloning is cheap; every clone observes the same outcome.
#[derive(Clone)]
pub struct LoadHandle {
    kind: AssetKind,
    id: Arc<str>,
    inner: LoadFuture,
}

impl LoadHandle {
    fn new(kind: AssetKind, id: &str, future: BoxFuture<'static, Result<(), LoadError>>) -> Self {
        let logged: Arc<str> = Arc::from(id);
        let id = Arc::clone(&logged);
        let inner = future
            .inspect(move |result| match result {
                Ok(()) => tracing::debug!(%kind, id = %logged, "Dependency loaded"),
                Err(e) => {
                    tracing::warn!(%kind, id = %logged, error = %e, "Dependency failed to load");
                }
            })
            .boxed()
            .shared();
        Self { kind, id, inner }
    }

    /// A handle for a resource that was already on the page.
    fn ready(kind: AssetKind, id: &str) -> Self {
        Self {
            kind,
            id: Arc::from(id),
            inner: future::ready(Ok(())).boxed().shared(),
        }
    }

    /// Script or style.
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// The resource id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the load to settle.
    pub async fn wait(&self) -> Result<(), LoadError> {
        self.inner.clone().await
    }

    /// The outcome, if the load has settled and been observed.
    pub fn outcome(&self) -> Option<Result<(), LoadError>> {
        self.inner.peek().cloned()
    }

    /// Whether two handles track the same load.
    pub fn same_as(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Polls the load in the background when a runtime is available, so
    /// queued insertions happen even if nobody awaits them.
    fn drive(&self) {
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(self.inner.clone());
        }
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// What an initializer receives.
#[derive(Debug, Clone)]
pub struct ComponentContext<E> {
    /// The registered component name.
    pub name: String,
    /// The instance being initialized.
    pub instance_id: String,
    /// The instance's elements.
    pub elements: Vec<E>,
    /// The value produced by the instance's data factory, if any.
    pub data: Option<Value>,
}

/// A component initializer.
pub type Initializer<E> = Arc<dyn Fn(ComponentContext<E>) + Send + Sync>;

/// Produces the data passed to an initializer.
pub type DataFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// The result of one `call_component`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The initializer ran.
    Invoked,
    /// The instance was initialized before; nothing happened.
    AlreadyCalled,
    /// No initializer is registered under the name.
    NotRegistered,
    /// An input id was given but no data factory is registered for it.
    MissingData,
    /// The document has no elements for the instance.
    NoElements,
    /// A script the component depends on failed; it was skipped.
    DependencyFailed(LoadError),
}

/// One call made while executing a payload.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Component name.
    pub name: String,
    /// Instance id.
    pub instance_id: String,
    /// What happened.
    pub outcome: CallOutcome,
}

/// Everything [`Loader::execute`] did.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Handles for every `Load` instruction, in order.
    pub loads: Vec<LoadHandle>,
    /// Every `Call` instruction, in order.
    pub calls: Vec<CallRecord>,
    /// `Load` instructions whose markup was rejected.
    pub errors: Vec<TagParseError>,
}

impl ExecutionReport {
    /// Number of initializers that ran.
    pub fn invoked(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.outcome == CallOutcome::Invoked)
            .count()
    }
}

struct State<E, S> {
    loaded: S,
    handles: HashMap<(AssetKind, String), LoadHandle>,
    script_tail: Option<LoadHandle>,
    components: HashMap<String, Initializer<E>>,
    data: HashMap<(String, String), DataFactory>,
    called: HashSet<String>,
}

/// Loads component dependencies into a [`Document`] exactly once.
pub struct Loader<D: Document, S: LoadedSet = MemoryLoadedSet> {
    document: Arc<D>,
    state: Mutex<State<D::Element, S>>,
}

impl<D: Document> Loader<D> {
    /// Creates a loader with an empty in-memory loaded set.
    pub fn new(document: Arc<D>) -> Self {
        Self::with_loaded_set(document, MemoryLoadedSet::new())
    }
}

impl<D: Document, S: LoadedSet> Loader<D, S> {
    /// Creates a loader over an existing loaded set.
    pub fn with_loaded_set(document: Arc<D>, loaded: S) -> Self {
        Self {
            document,
            state: Mutex::new(State {
                loaded,
                handles: HashMap::new(),
                script_tail: None,
                components: HashMap::new(),
                data: HashMap::new(),
                called: HashSet::new(),
            }),
        }
    }

    /// The document this loader inserts into.
    pub fn document(&self) -> &Arc<D> {
        &self.document
    }

    fn state(&self) -> MutexGuard<'_, State<D::Element, S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests a dependency and returns its completion handle at once.
    ///
    /// If the resource is already loaded or loading, nothing is inserted
    /// and the existing handle is returned.
    pub fn load_script(&self, kind: AssetKind, markup: &str) -> Result<LoadHandle, TagParseError> {
        let tag = TagMarkup::parse_as(kind, markup)?;
        // parse_as guarantees a resource id.
        let id = tag.resource_id().unwrap_or_default().to_string();

        let mut state = self.state();
        if state.loaded.contains(kind, &id) {
            tracing::trace!(%kind, %id, "Dependency already requested");
            let handle = state
                .handles
                .entry((kind, id.clone()))
                .or_insert_with(|| LoadHandle::ready(kind, &id))
                .clone();
            return Ok(handle);
        }
        state.loaded.insert(kind, &id);

        let future = match kind {
            AssetKind::Script => match state
                .script_tail
                .take()
                .filter(|prev| prev.outcome().is_none())
            {
                Some(prev) => {
                    let document = Arc::clone(&self.document);
                    async move {
                        prev.wait().await.ok();
                        document.insert(&tag).await
                    }
                    .boxed()
                }
                None => self.document.insert(&tag),
            },
            AssetKind::Style => self.document.insert(&tag),
        };

        let handle = LoadHandle::new(kind, &id, future);
        if kind == AssetKind::Script {
            state.script_tail = Some(handle.clone());
        }
        state.handles.insert((kind, id.clone()), handle.clone());
        drop(state);

        tracing::debug!(%kind, %id, "Requested dependency");
        handle.drive();
        Ok(handle)
    }

    /// Records a resource the page already has, so it is never inserted.
    ///
    /// Returns `true` if the resource was not known before.
    pub fn mark_script_loaded(&self, kind: AssetKind, id: &str) -> bool {
        let mut state = self.state();
        let added = state.loaded.insert(kind, id);
        state
            .handles
            .entry((kind, id.to_string()))
            .or_insert_with(|| LoadHandle::ready(kind, id));
        added
    }

    /// Whether a resource is loaded or loading.
    pub fn is_loaded(&self, kind: AssetKind, id: &str) -> bool {
        self.state().loaded.contains(kind, id)
    }

    /// The handle of a requested or marked resource.
    pub fn handle(&self, kind: AssetKind, id: &str) -> Option<LoadHandle> {
        self.state().handles.get(&(kind, id.to_string())).cloned()
    }

    /// Registers the initializer for a component. A later registration
    /// under the same name replaces it.
    pub fn register_component<F>(&self, name: impl Into<String>, init: F)
    where
        F: Fn(ComponentContext<D::Element>) + Send + Sync + 'static,
    {
        self.state().components.insert(name.into(), Arc::new(init));
    }

    /// Registers the data factory for one component input.
    pub fn register_component_data<F>(
        &self,
        name: impl Into<String>,
        input_id: impl Into<String>,
        factory: F,
    ) where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state()
            .data
            .insert((name.into(), input_id.into()), Arc::new(factory));
    }

    /// Runs a component's initializer for one instance.
    ///
    /// Each instance is initialized at most once; only an `Invoked` call
    /// counts, so a call that failed for a missing registration can be
    /// retried.
    pub fn call_component(
        &self,
        name: &str,
        instance_id: &str,
        input_id: Option<&str>,
    ) -> CallOutcome {
        let (init, factory) = {
            let state = self.state();
            if state.called.contains(instance_id) {
                return CallOutcome::AlreadyCalled;
            }
            let Some(init) = state.components.get(name).cloned() else {
                tracing::warn!(
                    component = %name,
                    instance = %instance_id,
                    "No initializer registered"
                );
                return CallOutcome::NotRegistered;
            };
            let factory = match input_id {
                Some(input) => {
                    let Some(factory) = state.data.get(&(name.to_string(), input.to_string()))
                    else {
                        tracing::warn!(
                            component = %name,
                            input = %input,
                            "No data factory registered"
                        );
                        return CallOutcome::MissingData;
                    };
                    Some(Arc::clone(factory))
                }
                None => None,
            };
            (init, factory)
        };

        let elements = self.document.elements_for_instance(instance_id);
        if elements.is_empty() {
            tracing::warn!(
                component = %name,
                instance = %instance_id,
                "No elements found for instance"
            );
            return CallOutcome::NoElements;
        }
        if !self.state().called.insert(instance_id.to_string()) {
            return CallOutcome::AlreadyCalled;
        }

        let data = factory.map(|f| f());
        init(ComponentContext {
            name: name.to_string(),
            instance_id: instance_id.to_string(),
            elements,
            data,
        });
        tracing::debug!(component = %name, instance = %instance_id, "Initialized component");
        CallOutcome::Invoked
    }

    /// Executes a payload in order.
    ///
    /// Each `Call` waits for the component's scripts (or, when the call
    /// lists none, for every script requested before it). A failed script
    /// skips only the components that depend on it.
    pub async fn execute(&self, payload: &Payload) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut scripts: Vec<LoadHandle> = Vec::new();

        for instruction in payload {
            match instruction {
                Instruction::MarkLoaded { kind, id } => {
                    self.mark_script_loaded(*kind, id);
                }
                Instruction::Load { kind, tag } => match self.load_script(*kind, tag) {
                    Ok(handle) => {
                        if *kind == AssetKind::Script {
                            scripts.push(handle.clone());
                        }
                        report.loads.push(handle);
                    }
                    Err(e) => {
                        tracing::warn!(%kind, error = %e, "Rejected dependency markup");
                        report.errors.push(e);
                    }
                },
                Instruction::Call {
                    name,
                    instance_id,
                    input_id,
                    deps,
                } => {
                    let settled = match self.dependency_handles(deps, &scripts) {
                        Ok(waits) => wait_all(&waits).await,
                        Err(e) => Err(e),
                    };
                    let outcome = match settled {
                        Ok(()) => self.call_component(name, instance_id, input_id.as_deref()),
                        Err(e) => {
                            tracing::warn!(
                                component = %name,
                                instance = %instance_id,
                                error = %e,
                                "Skipping component with a failed dependency"
                            );
                            CallOutcome::DependencyFailed(e)
                        }
                    };
                    report.calls.push(CallRecord {
                        name: name.clone(),
                        instance_id: instance_id.clone(),
                        outcome,
                    });
                }
            }
        }

        report
    }
}

impl<D: Document, S: LoadedSet> Loader<D, S> {
    /// The handles a call waits for: its listed scripts, or every script
    /// issued so far when it lists none. A listed script that was never
    /// requested fails the call.
    fn dependency_handles(
        &self,
        deps: &[String],
        issued: &[LoadHandle],
    ) -> Result<Vec<LoadHandle>, LoadError> {
        if deps.is_empty() {
            return Ok(issued.to_vec());
        }
        deps.iter()
            .map(|id| {
                self.handle(AssetKind::Script, id).ok_or_else(|| {
                    tracing::warn!(id = %id, "Dependency was never requested");
                    LoadError::Abandoned(id.clone())
                })
            })
            .collect()
    }
}

/// Waits for every handle in order and reports the first failure.
async fn wait_all(handles: &[LoadHandle]) -> Result<(), LoadError> {
    let mut first_error = None;
    for handle in handles {
        if let Err(e) = handle.wait().await {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
