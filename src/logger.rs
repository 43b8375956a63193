// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use colored::Color;
use parking_lot::Mutex;

use crate::Level;
use crate::bus::ChangeEvent;
use crate::bus::ChangeKind;
use crate::bus::Subscription;
use crate::color::LABEL_PALETTE;
use crate::filter::FilterEngine;
use crate::record::Metadata;
use crate::record::Record;
use crate::transport::TransportRegistry;

/// The namespace that is always enabled and never disabled by a change event.
pub const ALWAYS_ON_NAMESPACE: &str = "APP";

/// The separator printed by [`Logger::hr`].
pub const HORIZONTAL_RULE: &str =
    "------------------------------------------------------------";

struct Inner {
    namespace: Arc<str>,
    enabled: AtomicBool,
    // false until creation decided this is not a stub; markers are only logged once live
    live: AtomicBool,
    color: Option<Color>,
    registry: Arc<TransportRegistry>,
}

impl Inner {
    fn emit(
        &self,
        level: Level,
        message: &dyn fmt::Display,
        metadata: Option<&Metadata>,
        raw: bool,
    ) -> bool {
        let record = Record::new(&self.namespace, level, message)
            .with_metadata(metadata)
            .with_raw(raw)
            .with_label_color(self.color);
        self.registry.log(&record)
    }

    fn on_change(&self, event: &ChangeEvent) {
        if event.namespace() != &*self.namespace {
            return;
        }

        let live = self.live.load(Ordering::Acquire);
        match event.kind() {
            ChangeKind::Enable => {
                self.enabled.store(true, Ordering::Release);
                if live {
                    self.emit(Level::Debug, &"enabled", None, false);
                }
            }
            ChangeKind::Disable => {
                if &*self.namespace == ALWAYS_ON_NAMESPACE {
                    return;
                }
                if live {
                    self.emit(Level::Debug, &"disabled", None, false);
                }
                self.enabled.store(false, Ordering::Release);
            }
        }
    }
}

struct Active {
    inner: Arc<Inner>,
    subscription: Mutex<Option<Subscription>>,
}

/// A logger bound to one namespace.
///
/// A logger is either active or a disabled stub, decided when it is created:
///
/// * An active logger follows enable and disable events for its exact namespace. Each call checks
///   the live flag and, if enabled, dispatches to its [`TransportRegistry`].
/// * A disabled stub is created when its namespace is not enabled at creation. It never
///   dispatches, and every call returns `false`.
///
/// Log methods return whether any transport handled the record, so callers can fall back to
/// other output when nothing did.
///
/// Cloning yields another handle to the same logger.
#[derive(Clone)]
pub struct Logger {
    namespace: Arc<str>,
    active: Option<Arc<Active>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("namespace", &self.namespace)
            .field("active", &self.active.is_some())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Logger {
    fn create(
        namespace: &str,
        engine: &FilterEngine,
        registry: Arc<TransportRegistry>,
        color: Option<Color>,
    ) -> Logger {
        let namespace: Arc<str> = Arc::from(namespace);
        let inner = Arc::new(Inner {
            namespace: namespace.clone(),
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(false),
            color,
            registry,
        });

        // subscribe before checking so that a change racing with creation is not lost
        let subscription = {
            let inner = Arc::downgrade(&inner);
            engine.subscribe(move |event| {
                if let Some(inner) = inner.upgrade() {
                    inner.on_change(event);
                }
            })
        };

        if &*namespace != ALWAYS_ON_NAMESPACE && !engine.is_enabled(&namespace) {
            return Logger::disabled(&namespace);
        }
        inner.live.store(true, Ordering::Release);

        Logger {
            namespace,
            active: Some(Arc::new(Active {
                inner,
                subscription: Mutex::new(Some(subscription)),
            })),
        }
    }

    /// Create a disabled stub.
    pub fn disabled(namespace: &str) -> Logger {
        Logger {
            namespace: Arc::from(namespace),
            active: None,
        }
    }

    /// The namespace this logger is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether calls are currently dispatched.
    pub fn is_enabled(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.inner.enabled.load(Ordering::Acquire))
    }

    /// Whether this logger is a disabled stub.
    pub fn is_stub(&self) -> bool {
        self.active.is_none()
    }

    fn dispatch(
        &self,
        level: Level,
        message: &dyn fmt::Display,
        metadata: Option<&Metadata>,
        raw: bool,
    ) -> bool {
        match &self.active {
            Some(active) if active.inner.enabled.load(Ordering::Acquire) => {
                active.inner.emit(level, message, metadata, raw)
            }
            _ => false,
        }
    }

    /// Log a message at the given level.
    pub fn log(&self, level: Level, message: impl fmt::Display) -> bool {
        self.dispatch(level, &message, None, false)
    }

    /// Log a message with metadata at the given level.
    pub fn log_with(&self, level: Level, message: impl fmt::Display, metadata: &Metadata) -> bool {
        self.dispatch(level, &message, Some(metadata), false)
    }

    /// Log a message at a level given by name.
    ///
    /// Unknown level names are not an error: the call is unhandled and returns `false`.
    pub fn log_named(&self, level: &str, message: impl fmt::Display) -> bool {
        match level.parse::<Level>() {
            Ok(level) => self.log(level, message),
            Err(_) => false,
        }
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Debug, message)
    }

    /// Log at debug level.
    pub fn silly(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Debug, message)
    }

    /// Log at info level.
    pub fn info(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Info, message)
    }

    /// Log at warn level.
    pub fn warn(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Warn, message)
    }

    /// Log at error level.
    pub fn error(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Error, message)
    }

    /// Log at critical level.
    pub fn critical(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Critical, message)
    }

    /// Print a separator line at debug level, without timestamp or level decoration.
    pub fn hr(&self) -> bool {
        self.dispatch(Level::Debug, &HORIZONTAL_RULE, None, true)
    }

    /// The top level of this logger's transports. `None` for a disabled stub.
    pub fn level(&self) -> Option<Level> {
        self.transports().map(|registry| registry.level())
    }

    /// Set the top level, overriding every sink level of this logger's transports.
    ///
    /// The registry is shared by every logger of the same factory. Does nothing on a stub.
    pub fn set_level(&self, level: Level) {
        if let Some(registry) = self.transports() {
            registry.set_level(level);
        }
    }

    /// The transports of this logger. `None` for a disabled stub.
    pub fn transports(&self) -> Option<&Arc<TransportRegistry>> {
        self.active.as_ref().map(|active| &active.inner.registry)
    }

    /// Flush the transports of this logger.
    pub fn flush(&self) {
        if let Some(registry) = self.transports() {
            registry.flush();
        }
    }

    /// Stop following enable and disable events.
    ///
    /// The logger keeps its current enabled state. Dropping the last clone of a logger disposes
    /// it as well.
    pub fn dispose(&self) {
        if let Some(active) = &self.active {
            active.subscription.lock().take();
        }
    }
}

struct FactoryInner {
    engine: FilterEngine,
    registry: Arc<TransportRegistry>,
    palette: Vec<Color>,
    next_color: AtomicUsize,
    loggers: Mutex<HashMap<String, Logger>>,
}

/// Creates loggers that share one filter engine and one transport registry.
///
/// Active loggers are cached by namespace, so asking twice for the same namespace returns the
/// same logger. Disabled stubs are not cached: asking again after the namespace was enabled
/// yields an active logger.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use debugforth::LoggerFactory;
/// use debugforth::filter::FilterEngine;
/// use debugforth::sink::Capture;
/// use debugforth::transport::TransportKind;
/// use debugforth::transport::TransportRegistry;
///
/// let capture = Capture::default();
/// let registry = TransportRegistry::builder()
///     .sink(TransportKind::Console, capture.clone())
///     .build();
/// let factory = LoggerFactory::new(FilterEngine::new(), Arc::new(registry));
///
/// factory.engine().enable("db:*");
/// let log = factory.logger("db:query");
/// assert!(log.info("select 1"));
/// assert_eq!(capture.messages(), vec!["select 1"]);
/// ```
#[derive(Clone)]
pub struct LoggerFactory {
    inner: Arc<FactoryInner>,
}

impl fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("engine", &self.inner.engine)
            .field("registry", &self.inner.registry)
            .field("loggers", &self.inner.loggers.lock().len())
            .finish()
    }
}

impl LoggerFactory {
    /// Create a factory.
    pub fn new(engine: FilterEngine, registry: Arc<TransportRegistry>) -> Self {
        Self::with_palette(engine, registry, LABEL_PALETTE)
    }

    /// Create a factory assigning label colors from the given palette, in rotation.
    ///
    /// An empty palette leaves labels uncolored.
    pub fn with_palette(
        engine: FilterEngine,
        registry: Arc<TransportRegistry>,
        palette: impl IntoIterator<Item = Color>,
    ) -> Self {
        Self {
            inner: Arc::new(FactoryInner {
                engine,
                registry,
                palette: palette.into_iter().collect(),
                next_color: AtomicUsize::new(0),
                loggers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide factory: the global engine and a console transport.
    pub fn global() -> &'static LoggerFactory {
        static GLOBAL: OnceLock<LoggerFactory> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            LoggerFactory::new(
                FilterEngine::global().clone(),
                Arc::new(TransportRegistry::default()),
            )
        })
    }

    /// Get the logger for a namespace.
    pub fn logger(&self, namespace: &str) -> Logger {
        let mut loggers = self.inner.loggers.lock();
        if let Some(logger) = loggers.get(namespace) {
            return logger.clone();
        }

        // only active loggers take a color from the rotation
        let engine = &self.inner.engine;
        let color = if namespace == ALWAYS_ON_NAMESPACE || engine.is_enabled(namespace) {
            self.next_color()
        } else {
            None
        };
        let logger = Logger::create(namespace, engine, self.inner.registry.clone(), color);
        if !logger.is_stub() {
            loggers.insert(namespace.to_owned(), logger.clone());
        }
        logger
    }

    /// The cached logger of a namespace, if an active one was created.
    pub(crate) fn cached(&self, namespace: &str) -> Option<Logger> {
        self.inner.loggers.lock().get(namespace).cloned()
    }

    /// Dispose the cached logger of a namespace and forget it.
    pub fn dispose(&self, namespace: &str) {
        if let Some(logger) = self.inner.loggers.lock().remove(namespace) {
            logger.dispose();
        }
    }

    /// The filter engine.
    pub fn engine(&self) -> &FilterEngine {
        &self.inner.engine
    }

    /// The shared transport registry.
    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.inner.registry
    }

    fn next_color(&self) -> Option<Color> {
        let palette = &self.inner.palette;
        if palette.is_empty() {
            return None;
        }
        let n = self.inner.next_color.fetch_add(1, Ordering::Relaxed);
        Some(palette[n % palette.len()])
    }
}

/// Get the logger for a namespace from the process-wide factory.
///
/// The enabled namespaces are initialized from the `DEBUG` environment variable.
pub fn logger(namespace: &str) -> Logger {
    LoggerFactory::global().logger(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Capture;
    use crate::transport::TransportKind;

    fn factory() -> (LoggerFactory, Capture) {
        let capture = Capture::default();
        let registry = TransportRegistry::builder()
            .sink(TransportKind::Console, capture.clone())
            .build();
        let factory = LoggerFactory::new(FilterEngine::new(), Arc::new(registry));
        (factory, capture)
    }

    #[test]
    fn test_no_markers_before_handle_is_live() {
        let capture = Capture::default();
        let registry = TransportRegistry::builder()
            .sink(TransportKind::Console, capture.clone())
            .build();
        let inner = Inner {
            namespace: Arc::from("db"),
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(false),
            color: None,
            registry: Arc::new(registry),
        };

        inner.on_change(&ChangeEvent::disable("db"));
        assert!(!inner.enabled.load(Ordering::Acquire));
        inner.on_change(&ChangeEvent::enable("db"));
        assert!(inner.enabled.load(Ordering::Acquire));
        assert!(capture.records().is_empty());

        inner.live.store(true, Ordering::Release);
        inner.on_change(&ChangeEvent::disable("db"));
        assert_eq!(capture.messages(), vec!["disabled"]);
    }

    #[test]
    fn test_disabled_stub_is_noop() {
        let (factory, capture) = factory();
        let log = factory.logger("db");

        assert!(log.is_stub());
        assert!(!log.is_enabled());
        assert!(!log.debug("a"));
        assert!(!log.warn("b"));
        assert!(!log.error("c"));
        assert!(!log.hr());
        assert_eq!(log.level(), None);
        assert!(capture.records().is_empty());
        assert_eq!(factory.engine().bus().subscriber_count(), 0);
    }

    #[test]
    fn test_active_logger_levels() {
        let (factory, capture) = factory();
        factory.engine().enable("db");
        let log = factory.logger("db");

        assert!(log.debug("d"));
        assert!(log.silly("s"));
        assert!(log.info("i"));
        assert!(log.warn("w"));
        assert!(log.error("e"));
        assert!(log.critical("c"));

        let levels = capture.records().iter().map(|r| r.level).collect::<Vec<_>>();
        assert_eq!(
            levels,
            vec![
                Level::Debug,
                Level::Debug,
                Level::Info,
                Level::Warn,
                Level::Error,
                Level::Critical
            ]
        );
    }

    #[test]
    fn test_unknown_level_name_is_unhandled() {
        let (factory, capture) = factory();
        factory.engine().enable("db");
        let log = factory.logger("db");

        assert!(!log.log_named("verbose", "x"));
        assert!(log.log_named("silly", "y"));
        assert_eq!(capture.messages(), vec!["y"]);
    }

    #[test]
    fn test_hr_is_raw_debug() {
        let (factory, capture) = factory();
        factory.engine().enable("db");
        assert!(factory.logger("db").hr());

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Debug);
        assert_eq!(records[0].message, HORIZONTAL_RULE);
        assert!(records[0].raw);
    }

    #[test]
    fn test_disable_event_flips_live_handle() {
        let (factory, capture) = factory();
        factory.engine().enable("db:*");
        let log = factory.logger("db:query");
        assert!(log.info("before"));

        factory.engine().disable("db:query");
        assert!(!log.is_enabled());
        assert!(!log.info("after"));

        factory.engine().enable("db:query");
        assert!(log.is_enabled());
        assert!(log.info("again"));

        assert_eq!(
            capture.messages(),
            vec!["before", "disabled", "enabled", "again"]
        );
    }

    #[test]
    fn test_events_match_exact_namespace_only() {
        let (factory, capture) = factory();
        factory.engine().enable("db:*");
        let log = factory.logger("db:query");

        // the wildcard token is not the handle's namespace
        factory.engine().disable("db:*");
        assert!(log.is_enabled());
        assert!(!factory.engine().is_enabled("db:query"));
        assert!(capture.records().is_empty());
    }

    #[test]
    fn test_always_on_namespace() {
        let (factory, capture) = factory();
        let app = factory.logger(ALWAYS_ON_NAMESPACE);
        assert!(app.is_enabled());

        factory.engine().disable(ALWAYS_ON_NAMESPACE);
        assert!(app.is_enabled());
        assert!(app.info("still here"));
        assert_eq!(capture.messages(), vec!["still here"]);
    }

    #[test]
    fn test_factory_caches_active_loggers() {
        let (factory, _) = factory();
        let stub = factory.logger("db");
        assert!(stub.is_stub());

        factory.engine().enable("db");
        let first = factory.logger("db");
        let second = factory.logger("db");
        assert!(!first.is_stub());
        assert_eq!(factory.engine().bus().subscriber_count(), 1);

        factory.engine().disable("db");
        assert!(!first.is_enabled());
        assert!(!second.is_enabled());
        assert!(stub.is_stub());
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let (factory, _) = factory();
        factory.engine().enable("db");
        let log = factory.logger("db");
        assert_eq!(factory.engine().bus().subscriber_count(), 1);

        factory.dispose("db");
        assert_eq!(factory.engine().bus().subscriber_count(), 0);

        factory.engine().disable("db");
        assert!(log.is_enabled());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let capture = Capture::default();
        let registry = Arc::new(
            TransportRegistry::builder()
                .sink(TransportKind::Console, capture)
                .build(),
        );
        let engine = FilterEngine::new();
        engine.enable("db");

        let log = Logger::create("db", &engine, registry, None);
        assert_eq!(engine.bus().subscriber_count(), 1);
        drop(log);
        assert_eq!(engine.bus().subscriber_count(), 0);
    }

    #[test]
    fn test_set_level_cascades_to_shared_registry() {
        let (factory, capture) = factory();
        factory.engine().enable("a b");
        let a = factory.logger("a");
        let b = factory.logger("b");

        a.set_level(Level::Error);
        assert_eq!(b.level(), Some(Level::Error));
        assert!(!b.warn("dropped"));
        assert!(b.error("kept"));
        assert_eq!(capture.messages(), vec!["kept"]);
    }

    #[test]
    fn test_label_colors_rotate() {
        let engine = FilterEngine::new();
        engine.enable("a,b,c");
        let factory = LoggerFactory::with_palette(
            engine,
            Arc::new(TransportRegistry::builder().build()),
            [Color::Red, Color::Blue],
        );

        assert!(factory.logger("z").is_stub());
        let colors = ["a", "b", "c"]
            .iter()
            .map(|ns| factory.logger(ns).active.as_ref().unwrap().inner.color)
            .collect::<Vec<_>>();
        assert_eq!(colors, vec![Some(Color::Red), Some(Color::Blue), Some(Color::Red)]);
    }
}
