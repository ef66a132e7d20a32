//! Request-scoped context carrying the logger and typed values.

use {
    super::{fields::FieldSet, logger::Logger},
    axum::extract::FromRequestParts,
    http::request::Parts,
    std::{any::Any, convert::Infallible, fmt, iter, sync::Arc},
};

enum Binding {
    Logger(Logger),
    Value(Box<dyn Any + Send + Sync>),
}

struct Frame {
    binding: Binding,
    parent: Option<Arc<Frame>>,
}

/// An immutable chain of bindings scoped to one unit of work.
///
/// Binding never changes the receiver: [`Context::bind`] and
/// [`Context::with_value`] return a child that answers its own lookups and
/// delegates the rest to its parent. Lookups walk from the innermost frame
/// outwards, so the nearest binding wins.
///
/// The request middleware stores a context in the request extensions; handlers
/// get it back through the [`Context`] or [`Logger`] extractors.
///
/// ```
/// use webframe::{Context, Logger, LoggingConfig, fields};
///
/// let root = Logger::console(LoggingConfig::default());
/// let ctx = Context::new().bind(root.clone());
///
/// let (logger, child) = ctx.derive_and_enrich(fields!("order" => 42));
/// assert!(Logger::ptr_eq(child.logger(), &logger));
/// assert!(Logger::ptr_eq(ctx.logger(), &root));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Frame>>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, binding: Binding) -> Context {
        Context {
            head: Some(Arc::new(Frame {
                binding,
                parent: self.head.clone(),
            })),
        }
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        iter::successors(self.head.as_deref(), |frame| frame.parent.as_deref())
    }

    /// Returns a child context whose logger lookups answer `logger`.
    #[must_use]
    pub fn bind(&self, logger: Logger) -> Context {
        self.push(Binding::Logger(logger))
    }

    /// Returns the nearest bound logger, or the process-wide default.
    pub fn logger(&self) -> &Logger {
        self.try_logger().unwrap_or_else(|| Logger::global())
    }

    /// Returns the nearest bound logger without falling back to the default.
    pub fn try_logger(&self) -> Option<&Logger> {
        self.frames().find_map(|frame| match &frame.binding {
            Binding::Logger(logger) => Some(logger),
            Binding::Value(_) => None,
        })
    }

    /// Looks up the current logger, enriches it with `fields` and binds the
    /// result into a child context. Calling it again on the child keeps
    /// accumulating fields.
    #[track_caller]
    pub fn derive_and_enrich(&self, fields: FieldSet) -> (Logger, Context) {
        let logger = self.logger().with(fields);
        let context = self.bind(logger.clone());
        (logger, context)
    }

    /// Returns a child context holding `value`, shadowing any outer value of
    /// the same type.
    #[must_use]
    pub fn with_value<T>(&self, value: T) -> Context
    where
        T: Send + Sync + 'static,
    {
        self.push(Binding::Value(Box::new(value)))
    }

    /// Returns the nearest value of type `T`.
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.frames().find_map(|frame| match &frame.binding {
            Binding::Value(value) => value.downcast_ref::<T>(),
            Binding::Logger(_) => None,
        })
    }

    fn depth(&self) -> usize {
        self.frames().count()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("logger", &self.try_logger())
            .finish()
    }
}

impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Context>().cloned().unwrap_or_default())
    }
}

/// Extracts the request's logger, or the default logger outside the
/// request middleware.
impl<S> FromRequestParts<S> for Logger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let logger = match parts.extensions.get::<Context>() {
            Some(context) => context.logger().clone(),
            None => Logger::global().clone(),
        };
        Ok(logger)
    }
}
