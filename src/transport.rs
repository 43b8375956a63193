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

//! Transports group sinks by kind and dispatch records to them.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Level;
use crate::record::Record;
use crate::sink::Console;
use crate::sink::Sink;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// The kind of a transport.
///
/// A kind only groups sinks; it does not imply an implementation. The crate ships console and
/// file sinks, while `Http` and `Webhook` carry whatever [`Sink`] the application registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Terminal output.
    Console,
    /// Local files.
    File,
    /// HTTP endpoints.
    Http,
    /// Webhooks.
    Webhook,
}

impl TransportKind {
    /// The lower-case name of this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Console => "console",
            TransportKind::File => "file",
            TransportKind::Http => "http",
            TransportKind::Webhook => "webhook",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(TransportKind::Console),
            "file" => Ok(TransportKind::File),
            "http" => Ok(TransportKind::Http),
            "webhook" => Ok(TransportKind::Webhook),
            _ => Err(Error::new("unknown transport kind").with_context("kind", s)),
        }
    }
}

struct SinkEntry {
    level: AtomicU8,
    sink: Box<dyn Sink>,
}

impl fmt::Debug for SinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkEntry")
            .field("level", &self.level())
            .field("sink", &self.sink)
            .finish()
    }
}

impl SinkEntry {
    fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }
}

#[derive(Debug)]
struct Transport {
    kind: TransportKind,
    sinks: Vec<SinkEntry>,
}

/// The sinks of a logger, grouped by transport kind.
///
/// Kinds are kept in the order they were first registered, and sinks in the order they were
/// added. Each sink has its own minimum level.
///
/// # Examples
///
/// ```
/// use debugforth::Level;
/// use debugforth::sink::Console;
/// use debugforth::sink::SingleFile;
/// use debugforth::transport::TransportKind;
/// use debugforth::transport::TransportRegistry;
///
/// let registry = TransportRegistry::builder()
///     .sink(TransportKind::Console, Console::default())
///     .sink_with_level(TransportKind::Console, Level::Error, Console::default())
///     .build();
/// ```
#[derive(Debug)]
pub struct TransportRegistry {
    level: AtomicU8,
    transports: Vec<Transport>,
    trap: Box<dyn Trap>,
}

impl Default for TransportRegistry {
    fn default() -> Self {
        TransportRegistry::builder()
            .sink(TransportKind::Console, Console::default())
            .build()
    }
}

impl TransportRegistry {
    /// Create a new empty [`TransportRegistryBuilder`].
    pub fn builder() -> TransportRegistryBuilder {
        TransportRegistryBuilder::default()
    }

    /// Dispatch a record.
    ///
    /// For every transport kind, the sinks whose level admits the record are tried in order until
    /// one reports it handled the record. Returns whether any transport handled it.
    ///
    /// A sink that fails is reported to the trap and counts as not handled; dispatch goes on with
    /// the next sink.
    pub fn log(&self, record: &Record) -> bool {
        let mut handled = false;

        for transport in &self.transports {
            for entry in &transport.sinks {
                if record.level() < entry.level() {
                    continue;
                }

                match entry.sink.log(record) {
                    Ok(true) => {
                        handled = true;
                        break;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        let err = err
                            .with_context("transport", transport.kind)
                            .with_context("namespace", record.namespace());
                        self.trap.trap(&err);
                    }
                }
            }
        }

        handled
    }

    /// Flush every sink, reporting failures to the trap.
    pub fn flush(&self) {
        for transport in &self.transports {
            for entry in &transport.sinks {
                if let Err(err) = entry.sink.flush() {
                    self.trap.trap(&err.with_context("transport", transport.kind));
                }
            }
        }
    }

    /// The current top level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Set the top level, overriding the level of every sink.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
        for transport in &self.transports {
            for entry in &transport.sinks {
                entry.level.store(level.as_u8(), Ordering::Relaxed);
            }
        }
    }

    /// The registered transport kinds, in registration order.
    pub fn kinds(&self) -> Vec<TransportKind> {
        self.transports.iter().map(|t| t.kind).collect()
    }

    /// The levels of the sinks of a kind, in order. Empty if the kind is not registered.
    pub fn sink_levels(&self, kind: TransportKind) -> Vec<Level> {
        self.transports
            .iter()
            .filter(|t| t.kind == kind)
            .flat_map(|t| t.sinks.iter().map(SinkEntry::level))
            .collect()
    }
}

/// A builder for [`TransportRegistry`].
#[must_use = "call `build` to construct the registry"]
#[derive(Debug)]
pub struct TransportRegistryBuilder {
    level: Level,
    transports: Vec<Transport>,
    trap: Box<dyn Trap>,
}

impl Default for TransportRegistryBuilder {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            transports: vec![],
            trap: Box::new(DefaultTrap::default()),
        }
    }
}

impl TransportRegistryBuilder {
    /// Add a sink admitting every level.
    pub fn sink(self, kind: TransportKind, sink: impl Into<Box<dyn Sink>>) -> Self {
        self.sink_with_level(kind, Level::Debug, sink)
    }

    /// Add a sink admitting records at `level` or above.
    pub fn sink_with_level(
        mut self,
        kind: TransportKind,
        level: Level,
        sink: impl Into<Box<dyn Sink>>,
    ) -> Self {
        let entry = SinkEntry {
            level: AtomicU8::new(level.as_u8()),
            sink: sink.into(),
        };

        match self.transports.iter_mut().find(|t| t.kind == kind) {
            Some(transport) => transport.sinks.push(entry),
            None => self.transports.push(Transport {
                kind,
                sinks: vec![entry],
            }),
        }
        self
    }

    /// Set the initial top level reported by [`TransportRegistry::level`].
    ///
    /// Unlike [`TransportRegistry::set_level`], this does not touch the sink levels.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the trap receiving sink errors. Defaults to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the registry.
    pub fn build(self) -> TransportRegistry {
        TransportRegistry {
            level: AtomicU8::new(self.level.as_u8()),
            transports: self.transports,
            trap: self.trap,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::sink::Capture;

    #[derive(Debug, Clone)]
    struct Probe {
        name: &'static str,
        handled: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Sink for Probe {
        fn log(&self, _: &Record) -> Result<bool, Error> {
            self.calls.lock().push(self.name);
            Ok(self.handled)
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Sink for Failing {
        fn log(&self, _: &Record) -> Result<bool, Error> {
            Err(Error::new("sink is broken"))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct CollectTrap(Arc<Mutex<Vec<String>>>);

    impl Trap for CollectTrap {
        fn trap(&self, err: &Error) {
            self.0.lock().push(err.to_string());
        }
    }

    fn probe(name: &'static str, handled: bool, calls: &Arc<Mutex<Vec<&'static str>>>) -> Probe {
        Probe {
            name,
            handled,
            calls: calls.clone(),
        }
    }

    #[test]
    fn test_unhandled_then_handled() {
        let calls = Arc::new(Mutex::new(vec![]));
        let registry = TransportRegistry::builder()
            .sink(TransportKind::Console, probe("console", false, &calls))
            .sink(TransportKind::Console, probe("file", true, &calls))
            .build();

        assert!(registry.log(&Record::new("x", Level::Error, &"x")));
        assert_eq!(*calls.lock(), vec!["console", "file"]);
    }

    #[test]
    fn test_short_circuit_within_kind() {
        let calls = Arc::new(Mutex::new(vec![]));
        let registry = TransportRegistry::builder()
            .sink(TransportKind::Console, probe("first", true, &calls))
            .sink(TransportKind::Console, probe("second", true, &calls))
            .sink(TransportKind::File, probe("file", true, &calls))
            .build();

        assert!(registry.log(&Record::new("x", Level::Info, &"x")));
        assert_eq!(*calls.lock(), vec!["first", "file"]);
    }

    #[test]
    fn test_kinds_keep_first_registration_order() {
        let calls = Arc::new(Mutex::new(vec![]));
        let registry = TransportRegistry::builder()
            .sink(TransportKind::File, probe("file-1", false, &calls))
            .sink(TransportKind::Console, probe("console", false, &calls))
            .sink(TransportKind::File, probe("file-2", false, &calls))
            .build();

        assert!(!registry.log(&Record::new("x", Level::Info, &"x")));
        assert_eq!(*calls.lock(), vec!["file-1", "file-2", "console"]);
        assert_eq!(
            registry.kinds(),
            vec![TransportKind::File, TransportKind::Console]
        );
    }

    #[test]
    fn test_empty_registry_is_unhandled() {
        let registry = TransportRegistry::builder().build();
        assert!(!registry.log(&Record::new("x", Level::Critical, &"x")));
    }

    #[test]
    fn test_sink_levels_gate_records() {
        let low = Capture::default().handled(false);
        let high = Capture::default();
        let registry = TransportRegistry::builder()
            .sink_with_level(TransportKind::Console, Level::Info, low.clone())
            .sink_with_level(TransportKind::Console, Level::Error, high.clone())
            .build();

        assert!(!registry.log(&Record::new("x", Level::Debug, &"debug")));
        assert!(!registry.log(&Record::new("x", Level::Warn, &"warn")));
        assert!(registry.log(&Record::new("x", Level::Critical, &"critical")));

        assert_eq!(low.messages(), vec!["warn", "critical"]);
        assert_eq!(high.messages(), vec!["critical"]);
    }

    #[test]
    fn test_set_level_cascades() {
        let capture = Capture::default();
        let registry = TransportRegistry::builder()
            .sink_with_level(TransportKind::Console, Level::Critical, capture.clone())
            .sink_with_level(TransportKind::File, Level::Debug, Capture::default())
            .build();
        assert_eq!(registry.level(), Level::Debug);

        registry.set_level(Level::Warn);
        assert_eq!(registry.level(), Level::Warn);
        assert_eq!(registry.sink_levels(TransportKind::Console), vec![Level::Warn]);
        assert_eq!(registry.sink_levels(TransportKind::File), vec![Level::Warn]);
        assert!(registry.sink_levels(TransportKind::Http).is_empty());

        assert!(!registry.log(&Record::new("x", Level::Info, &"info")));
        assert!(registry.log(&Record::new("x", Level::Warn, &"warn")));
        assert_eq!(capture.messages(), vec!["warn"]);
    }

    #[test]
    fn test_failing_sink_is_isolated() {
        let trap = CollectTrap::default();
        let capture = Capture::default();
        let registry = TransportRegistry::builder()
            .sink(TransportKind::Http, Failing)
            .sink(TransportKind::Http, capture.clone())
            .trap(trap.clone())
            .build();

        assert!(registry.log(&Record::new("api", Level::Error, &"boom")));
        assert_eq!(capture.messages(), vec!["boom"]);

        let errors = trap.0.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("sink is broken"));
        assert!(errors[0].contains("transport: http"));
        assert!(errors[0].contains("namespace: api"));
    }

    #[test]
    fn test_transport_kind_names() {
        for kind in [
            TransportKind::Console,
            TransportKind::File,
            TransportKind::Http,
            TransportKind::Webhook,
        ] {
            assert_eq!(kind.as_str().parse::<TransportKind>().unwrap(), kind);
        }
        assert!("syslog".parse::<TransportKind>().is_err());
    }
}
