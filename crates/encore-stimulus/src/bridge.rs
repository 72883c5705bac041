//! Runtime controller registry.
//!
//! Controllers are registered under normalized identifiers with one of three
//! loading policies:
//!
//! - **Eager**: the constructor is registered right away, or, for a deferred
//!   loader picked by [`BridgeOptions::should_eager_load`], as soon as its
//!   background import settles.
//! - **Lazy**: a placeholder is registered. The first activation of the
//!   identifier imports the real constructor and replaces the placeholder.
//!   Activations that arrive while that import is in flight are no-ops.
//! - **External**: entries from a generated controller table. Their identifiers
//!   are already final, and each entry is eager or lazy on its own.
//!
//! The registry lock is never held across an await.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{BoxFuture, FutureExt, join_all};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::BridgeError;
use crate::generator::ControllerSpec;
use crate::normalize::normalize_identifier;

pub type ImportError = Box<dyn StdError + Send + Sync>;

/// Deferred loader of a controller constructor.
pub type Importer<C> = Arc<dyn Fn() -> BoxFuture<'static, Result<C, ImportError>> + Send + Sync>;

type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;
type EagerPredicate = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Wraps an async closure into an [`Importer`].
pub fn importer<C, F, Fut>(load: F) -> Importer<C>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C, ImportError>> + Send + 'static,
{
    Arc::new(move || load().boxed())
}

/// A value of a controller context: a constructor or a deferred loader.
pub enum ContextEntry<C> {
    Constructor(C),
    Deferred(Importer<C>),
}

impl<C> ContextEntry<C> {
    pub fn deferred<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, ImportError>> + Send + 'static,
    {
        ContextEntry::Deferred(importer(load))
    }
}

/// An entry of a generated controller table.
pub struct ExternalController<C> {
    pub identifier: String,
    pub lazy: bool,
    pub importer: Importer<C>,
}

impl<C> ExternalController<C> {
    /// Builds runtime entries from generated specs, asking `resolve` for the
    /// importer of each spec.
    pub fn from_specs<'a>(
        specs: impl IntoIterator<Item = &'a ControllerSpec>,
        mut resolve: impl FnMut(&ControllerSpec) -> Importer<C>,
    ) -> Vec<Self> {
        specs
            .into_iter()
            .map(|spec| ExternalController {
                identifier: spec.identifier.clone(),
                lazy: spec.lazy,
                importer: resolve(spec),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Eager,
    Lazy,
    External,
}

/// Options of [`start_app`].
#[derive(Clone, Default)]
pub struct BridgeOptions {
    pub debug: bool,
    /// Replaces [`normalize_identifier`] for context entries.
    pub normalizer: Option<Normalizer>,
    /// Called with the context path and the identifier of every deferred
    /// loader. `true` imports it in the background instead of lazily.
    pub should_eager_load: Option<EagerPredicate>,
}

impl BridgeOptions {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    pub fn with_should_eager_load(
        mut self,
        predicate: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_eager_load = Some(Arc::new(predicate));
        self
    }

    fn identifier(&self, path: &str) -> String {
        match &self.normalizer {
            Some(normalizer) => normalizer(path),
            None => normalize_identifier(path),
        }
    }
}

impl fmt::Debug for BridgeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("debug", &self.debug)
            .field("normalizer", &self.normalizer.is_some())
            .field("should_eager_load", &self.should_eager_load.is_some())
            .finish()
    }
}

/// Outcome of [`Application::activate`].
#[derive(Debug)]
pub enum Activation<C> {
    /// The identifier already has its constructor.
    Ready(C),
    /// This activation imported the constructor and registered it.
    Resolved(C),
    /// Another activation is importing the constructor.
    AlreadyResolving,
    /// The import failed. The placeholder stays registered.
    Failed(BridgeError),
}

/// Placeholder for a controller whose constructor is not imported yet.
struct LazyController<C> {
    importer: Importer<C>,
    resolving: AtomicBool,
    kind: LoaderKind,
}

enum Registration<C> {
    Ready { constructor: C, kind: LoaderKind },
    Pending(Arc<LazyController<C>>),
}

struct AppInner<C> {
    registry: RwLock<IndexMap<String, Registration<C>>>,
    background: Mutex<Vec<JoinHandle<()>>>,
    debug: bool,
}

/// Controller registry shared by every element of a page.
pub struct Application<C> {
    inner: Arc<AppInner<C>>,
}

impl<C> Clone for Application<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Application<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(debug: bool) -> Self {
        Self {
            inner: Arc::new(AppInner {
                registry: RwLock::new(IndexMap::new()),
                background: Mutex::new(Vec::new()),
                debug,
            }),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug
    }

    /// Registers a constructor, replacing whatever `identifier` had.
    pub fn register(&self, identifier: impl Into<String>, constructor: C) {
        self.register_ready(identifier.into(), constructor, LoaderKind::Eager);
    }

    /// Registers a placeholder resolved on first activation.
    pub fn register_lazy(&self, identifier: impl Into<String>, importer: Importer<C>) {
        self.register_pending(identifier.into(), importer, LoaderKind::Lazy);
    }

    /// Activates one element using `identifier`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Unregistered`] when nothing is registered under `identifier`.
    pub async fn activate(&self, identifier: &str) -> Result<Activation<C>, BridgeError> {
        let lazy = {
            let registry = self.inner.registry.read();
            match registry.get(identifier) {
                None => {
                    return Err(BridgeError::Unregistered {
                        identifier: identifier.to_string(),
                    });
                }
                Some(Registration::Ready { constructor, .. }) => {
                    return Ok(Activation::Ready(constructor.clone()));
                }
                Some(Registration::Pending(lazy)) => Arc::clone(lazy),
            }
        };

        if lazy
            .resolving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(identifier, "lazy controller is already resolving");
            return Ok(Activation::AlreadyResolving);
        }

        match (lazy.importer)().await {
            Ok(constructor) => {
                let mut registry = self.inner.registry.write();
                // Only replace the placeholder this activation resolved.
                let still_pending = matches!(
                    registry.get(identifier),
                    Some(Registration::Pending(current)) if Arc::ptr_eq(current, &lazy)
                );
                if !still_pending {
                    // Replaced while importing. Report what the registry serves.
                    return match registry.get(identifier) {
                        Some(Registration::Ready { constructor, .. }) => {
                            debug!(identifier, "lazy controller was replaced while importing");
                            Ok(Activation::Ready(constructor.clone()))
                        }
                        Some(Registration::Pending(_)) => Ok(Activation::AlreadyResolving),
                        None => Err(BridgeError::Unregistered {
                            identifier: identifier.to_string(),
                        }),
                    };
                }
                registry.insert(
                    identifier.to_string(),
                    Registration::Ready {
                        constructor: constructor.clone(),
                        kind: lazy.kind,
                    },
                );
                drop(registry);
                self.log_registration(identifier, lazy.kind);
                Ok(Activation::Resolved(constructor))
            }
            Err(err) => {
                error!(identifier, error = %err, "failed to load lazy controller");
                lazy.resolving.store(false, Ordering::Release);
                Ok(Activation::Failed(BridgeError::LoadFailed {
                    identifier: identifier.to_string(),
                    message: err.to_string(),
                }))
            }
        }
    }

    /// The registered constructor, if `identifier` is resolved.
    pub fn constructor(&self, identifier: &str) -> Option<C> {
        match self.inner.registry.read().get(identifier)? {
            Registration::Ready { constructor, .. } => Some(constructor.clone()),
            Registration::Pending(_) => None,
        }
    }

    pub fn loader_kind(&self, identifier: &str) -> Option<LoaderKind> {
        self.inner
            .registry
            .read()
            .get(identifier)
            .map(|registration| match registration {
                Registration::Ready { kind, .. } => *kind,
                Registration::Pending(lazy) => lazy.kind,
            })
    }

    pub fn is_pending(&self, identifier: &str) -> bool {
        matches!(
            self.inner.registry.read().get(identifier),
            Some(Registration::Pending(_))
        )
    }

    /// Registered identifiers in registration order.
    pub fn identifiers(&self) -> Vec<String> {
        self.inner.registry.read().keys().cloned().collect()
    }

    /// Waits for every background import started so far.
    pub async fn settled(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.background.lock());
            if handles.is_empty() {
                return;
            }
            for result in join_all(handles).await {
                if let Err(err) = result {
                    error!(error = %err, "background controller import panicked");
                }
            }
        }
    }

    /// Imports `importer` in the background and registers the result.
    fn spawn_import(
        &self,
        identifier: String,
        importer: Importer<C>,
        kind: LoaderKind,
    ) -> Result<(), BridgeError> {
        let Ok(runtime) = Handle::try_current() else {
            return Err(BridgeError::NoRuntime { identifier });
        };
        let app = self.clone();
        let handle = runtime.spawn(async move {
            match importer().await {
                Ok(constructor) => app.register_ready(identifier, constructor, kind),
                Err(err) => error!(identifier = %identifier, error = %err, "failed to load controller"),
            }
        });
        self.inner.background.lock().push(handle);
        Ok(())
    }

    fn register_ready(&self, identifier: String, constructor: C, kind: LoaderKind) {
        self.log_registration(&identifier, kind);
        self.inner
            .registry
            .write()
            .insert(identifier, Registration::Ready { constructor, kind });
    }

    fn register_pending(&self, identifier: String, importer: Importer<C>, kind: LoaderKind) {
        debug!(identifier = %identifier, ?kind, "registered lazy controller placeholder");
        let lazy = LazyController {
            importer,
            resolving: AtomicBool::new(false),
            kind,
        };
        self.inner
            .registry
            .write()
            .insert(identifier, Registration::Pending(Arc::new(lazy)));
    }

    fn log_registration(&self, identifier: &str, kind: LoaderKind) {
        if self.inner.debug {
            info!(identifier, ?kind, "registered controller");
        } else {
            debug!(identifier, ?kind, "registered controller");
        }
    }
}

/// Starts an application with the controllers of `context` and `external`.
///
/// Context paths are turned into identifiers by the configured normalizer.
///
/// # Errors
///
/// [`BridgeError::NoRuntime`] when an entry must be imported in the
/// background and no tokio runtime is running.
pub fn start_app<C>(
    context: impl IntoIterator<Item = (String, ContextEntry<C>)>,
    options: BridgeOptions,
    external: impl IntoIterator<Item = ExternalController<C>>,
) -> Result<Application<C>, BridgeError>
where
    C: Clone + Send + Sync + 'static,
{
    let app = Application::new(options.debug);

    for (path, entry) in context {
        let identifier = options.identifier(&path);
        match entry {
            ContextEntry::Constructor(constructor) => app.register(identifier, constructor),
            ContextEntry::Deferred(importer) => {
                let eager = options
                    .should_eager_load
                    .as_ref()
                    .is_some_and(|predicate| predicate(&path, &identifier));
                if eager {
                    app.spawn_import(identifier, importer, LoaderKind::Eager)?;
                } else {
                    app.register_lazy(identifier, importer);
                }
            }
        }
    }

    for controller in external {
        if controller.lazy {
            app.register_pending(controller.identifier, controller.importer, LoaderKind::External);
        } else {
            app.spawn_import(controller.identifier, controller.importer, LoaderKind::External)?;
        }
    }

    Ok(app)
}
