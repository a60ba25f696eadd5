//! Migration context and diagnostics
//!
//! The context travels read-only through every rule of one migration pass.
//! The only thing a rule may do with it is report a [`Diagnostic`] for an
//! entry it had to abandon. Every report is logged at `warn` level before it
//! is forwarded to the optional [`DiagnosticSink`].

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use asset_tree::{NodePath, TreeError};
use parking_lot::Mutex;

use crate::version::Version;

/// Entity or component left in its pre-migration shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Rule that abandoned the entry
    pub rule: &'static str,
    /// Entity identity: its `Id`, else its `Name`, else its path
    pub entity: String,
    /// Component key within `Components`, when the failure is per-component
    pub component_key: Option<String>,
    /// Component tag, when the failure is per-component
    pub component_tag: Option<String>,
    /// Location of the failing node
    pub path: NodePath,
    /// Underlying cause
    pub cause: TreeError,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] entity {}", self.rule, self.entity)?;
        if let Some(tag) = &self.component_tag {
            write!(f, " component {tag}")?;
        }
        write!(f, " at {}: {}", self.path, self.cause)
    }
}

/// Receiver of non-fatal per-entry failures
pub trait DiagnosticSink: Send + Sync + Debug {
    /// Record one diagnostic
    fn report(&self, diagnostic: &Diagnostic);
}

/// Sink that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of collected diagnostics
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.lock().clone()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.inner.lock().push(diagnostic.clone());
    }
}

/// Ambient information for one migration pass
#[derive(Debug)]
pub struct MigrationContext {
    asset: String,
    recorded: Version,
    target: Version,
    sink: Option<Arc<dyn DiagnosticSink>>,
    reported: AtomicUsize,
}

impl MigrationContext {
    /// Create context for one asset
    ///
    /// `asset` identifies the originating file (path or URL) in logs.
    #[must_use]
    pub fn new(asset: impl Into<String>, recorded: Version, target: Version) -> Self {
        Self {
            asset: asset.into(),
            recorded,
            target,
            sink: None,
            reported: AtomicUsize::new(0),
        }
    }

    /// Attach a diagnostics sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Originating file identity
    #[inline]
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Version the document was saved with
    #[inline]
    #[must_use]
    pub fn recorded_version(&self) -> Version {
        self.recorded
    }

    /// Version to migrate to
    #[inline]
    #[must_use]
    pub fn target_version(&self) -> Version {
        self.target
    }

    /// Number of diagnostics reported through this context
    #[inline]
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }

    /// Report an abandoned entry
    pub fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            asset = %self.asset,
            rule = diagnostic.rule,
            entity = %diagnostic.entity,
            component = diagnostic.component_tag.as_deref().unwrap_or("-"),
            path = %diagnostic.path,
            cause = %diagnostic.cause,
            "entry left unmigrated"
        );
        self.reported.fetch_add(1, Ordering::Relaxed);
        if let Some(sink) = &self.sink {
            sink.report(&diagnostic);
        }
    }
}
