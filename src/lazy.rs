use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::{Dependency, PipelineError};

type BuildResult<T> = Result<Arc<T>, Box<dyn Error + Send + Sync>>;
type Factory<T> = Box<dyn Fn() -> BuildResult<T> + Send + Sync>;

/// Memoized client handle: built on first successful use, then shared.
///
/// A failed build is not cached, so a later request retries construction
/// once the configuration is fixed. Concurrent first calls wait on a single
/// build.
pub struct LazyHandle<T: ?Sized> {
    dependency: Dependency,
    cell: OnceCell<Arc<T>>,
    factory: Option<Factory<T>>,
}

impl<T: ?Sized> LazyHandle<T> {
    pub fn new<F>(dependency: Dependency, factory: F) -> Self
    where
        F: Fn() -> BuildResult<T> + Send + Sync + 'static,
    {
        Self {
            dependency,
            cell: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Wraps an already-built handle.
    pub fn ready(dependency: Dependency, handle: Arc<T>) -> Self {
        Self {
            dependency,
            cell: OnceCell::with_value(handle),
            factory: None,
        }
    }

    pub fn dependency(&self) -> Dependency {
        self.dependency
    }

    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the handle, building it if needed. Build failures are logged
    /// with their cause and reported as `UpstreamConfiguration`.
    pub fn get(&self) -> Result<Arc<T>, PipelineError> {
        let dependency = self.dependency;
        self.cell
            .get_or_try_init(|| {
                let factory = self.factory.as_ref().ok_or_else(|| {
                    Box::<dyn Error + Send + Sync>::from("handle has no factory")
                })?;
                factory()
            })
            .cloned()
            .map_err(|err| {
                tracing::error!(%dependency, error = %err, "failed to build client handle");
                PipelineError::UpstreamConfiguration { dependency }
            })
    }
}

impl<T: ?Sized> fmt::Debug for LazyHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHandle")
            .field("dependency", &self.dependency)
            .field("built", &self.is_built())
            .finish()
    }
}
