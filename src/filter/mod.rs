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

//! Namespace filtering.
//!
//! The enable spec is a list of namespace tokens separated by whitespace or commas. A `*` in a
//! token matches any sequence of characters, and a leading `-` turns the token into a skip
//! pattern. Skip patterns always win over allow patterns:
//!
//! ```
//! use debugforth::filter::FilterEngine;
//!
//! let engine = FilterEngine::new();
//! engine.enable("server:*,-server:debug");
//!
//! assert!(engine.is_enabled("server:http"));
//! assert!(!engine.is_enabled("server:debug"));
//! assert!(!engine.is_enabled("client:http"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::RwLock;

pub use self::pattern::Pattern;
pub use self::pattern::PatternSet;
pub use self::store::DEFAULT_SPEC_ENV;
pub use self::store::EnvStore;
pub use self::store::MemoryStore;
pub use self::store::SpecStore;
use self::pattern::Directive;
use self::pattern::parse_spec;
use crate::bus::ChangeBus;
use crate::bus::ChangeEvent;
use crate::bus::Subscription;

mod pattern;
mod store;

struct EngineInner {
    patterns: RwLock<PatternSet>,
    bus: ChangeBus,
    store: Box<dyn SpecStore>,
}

/// The namespace filter engine.
///
/// An engine owns one set of accumulated allow/skip patterns, the change bus that notifies live
/// loggers, and the store the raw spec is persisted to. Cloning yields another handle to the same
/// state, so every logger created from one engine observes the same patterns.
#[derive(Clone)]
pub struct FilterEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEngine")
            .field("patterns", &*self.inner.patterns.read())
            .field("bus", &self.inner.bus)
            .field("store", &self.inner.store)
            .finish()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEngine {
    /// Create an isolated engine with nothing enabled, persisting to memory.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::default())
    }

    /// Create an engine persisting to the given store, without loading from it.
    pub fn with_store(store: impl Into<Box<dyn SpecStore>>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                patterns: RwLock::new(PatternSet::default()),
                bus: ChangeBus::new(),
                store: store.into(),
            }),
        }
    }

    /// Create an engine and enable the spec previously persisted in the store, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use debugforth::filter::FilterEngine;
    /// use debugforth::filter::MemoryStore;
    ///
    /// let engine = FilterEngine::from_store(MemoryStore::new("db:*"));
    /// assert!(engine.is_enabled("db:query"));
    /// ```
    pub fn from_store(store: impl Into<Box<dyn SpecStore>>) -> Self {
        let engine = Self::with_store(store);
        if let Some(spec) = engine.load() {
            engine.enable(&spec);
        }
        engine
    }

    /// Create an engine that enables the current value of the named environment variable.
    ///
    /// The variable is read once. Later specs are persisted in memory only.
    pub fn from_env(name: &'static str) -> Self {
        Self::from_store(EnvStore::new(name))
    }

    /// The process-wide engine, initialized on first use from the `DEBUG` environment variable.
    ///
    /// The process environment is never written.
    pub fn global() -> &'static FilterEngine {
        static GLOBAL: OnceLock<FilterEngine> = OnceLock::new();
        GLOBAL.get_or_init(|| FilterEngine::from_env(DEFAULT_SPEC_ENV))
    }

    /// Enable namespaces.
    ///
    /// Plain tokens become allow patterns and publish an enable event with the raw token. Tokens
    /// with a leading `-` become skip patterns. The raw spec is persisted first.
    pub fn enable(&self, spec: &str) {
        self.save(Some(spec));

        let mut enabled = vec![];
        {
            let mut patterns = self.inner.patterns.write();
            for directive in parse_spec(spec) {
                match directive {
                    Directive::Skip(token) => {
                        if let Ok(pattern) = Pattern::compile(token) {
                            patterns.push_skip(pattern);
                        }
                    }
                    Directive::Allow(token) => {
                        if let Ok(pattern) = Pattern::compile(token) {
                            patterns.push_allow(pattern);
                            enabled.push(token);
                        }
                    }
                }
            }
        }

        for namespace in enabled {
            self.inner.bus.publish(&ChangeEvent::enable(namespace));
        }
    }

    /// Disable namespaces.
    ///
    /// Every token becomes a skip pattern. A plain token also revokes an allow pattern with the
    /// identical compiled form and publishes a disable event with the raw token. The raw spec is
    /// persisted last.
    pub fn disable(&self, spec: &str) {
        let mut disabled = vec![];
        {
            let mut patterns = self.inner.patterns.write();
            for directive in parse_spec(spec) {
                match directive {
                    Directive::Skip(token) => {
                        if let Ok(pattern) = Pattern::compile(token) {
                            patterns.push_skip(pattern);
                        }
                    }
                    Directive::Allow(token) => {
                        if let Ok(pattern) = Pattern::compile(token) {
                            patterns.revoke(&pattern);
                            patterns.push_skip(pattern);
                            disabled.push(token);
                        }
                    }
                }
            }
        }

        for namespace in disabled {
            self.inner.bus.publish(&ChangeEvent::disable(namespace));
        }

        self.save(Some(spec));
    }

    /// Whether the namespace is enabled.
    pub fn is_enabled(&self, namespace: &str) -> bool {
        self.inner.patterns.read().is_enabled(namespace)
    }

    /// Persist an empty spec.
    ///
    /// This behaves as `enable("")`: the persisted spec is cleared to the empty string, while
    /// patterns accumulated in memory, skip patterns included, are left in place.
    pub fn disable_all(&self) {
        self.enable("");
    }

    /// Load the persisted spec.
    pub fn load(&self) -> Option<String> {
        self.inner.store.load()
    }

    /// Persist a spec. `None` clears the persisted value.
    pub fn save(&self, spec: Option<&str>) {
        self.inner.store.save(spec);
    }

    /// A snapshot of the current patterns.
    pub fn patterns(&self) -> PatternSet {
        self.inner.patterns.read().clone()
    }

    /// The compiled allow patterns, in insertion order.
    pub fn names(&self) -> Vec<String> {
        let patterns = self.inner.patterns.read();
        patterns.allow().iter().map(|p| p.as_str().to_owned()).collect()
    }

    /// The compiled skip patterns, in insertion order.
    pub fn skips(&self) -> Vec<String> {
        let patterns = self.inner.patterns.read();
        patterns.skip().iter().map(|p| p.as_str().to_owned()).collect()
    }

    /// The change bus of this engine.
    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    pub(crate) fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.bus.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::bus::ChangeKind;

    #[test]
    fn test_enable_wildcard() {
        let engine = FilterEngine::new();
        engine.enable("a:*");

        assert!(engine.is_enabled("a:b"));
        assert!(engine.is_enabled("a:b:c"));
        assert!(!engine.is_enabled("x:b"));
    }

    #[test]
    fn test_nothing_enabled_by_default() {
        let engine = FilterEngine::new();
        assert!(!engine.is_enabled("a"));
        assert!(!engine.is_enabled(""));
    }

    #[test]
    fn test_skip_added_later_wins() {
        let engine = FilterEngine::new();
        engine.enable("*");
        engine.enable("-debug:*");

        assert!(!engine.is_enabled("debug:sql"));
        assert!(engine.is_enabled("http:request"));
    }

    #[test]
    fn test_skip_added_first_wins() {
        let engine = FilterEngine::new();
        engine.enable("-db:secret db:*");

        assert!(!engine.is_enabled("db:secret"));
        assert!(engine.is_enabled("db:query"));
    }

    #[test]
    fn test_disable_revokes_exact_allow() {
        let engine = FilterEngine::new();
        engine.enable("a:b");
        assert!(engine.is_enabled("a:b"));

        engine.disable("a:b");
        assert!(!engine.is_enabled("a:b"));
        assert!(engine.names().is_empty());
        assert_eq!(engine.skips(), vec!["^a:b$".to_string()]);
    }

    #[test]
    fn test_disable_keeps_wider_allow() {
        let engine = FilterEngine::new();
        engine.enable("a:*");
        engine.disable("a:b");

        assert!(!engine.is_enabled("a:b"));
        assert!(engine.is_enabled("a:c"));
        assert_eq!(engine.names(), vec!["^a:.*?$".to_string()]);
    }

    #[test]
    fn test_disable_skip_token() {
        let engine = FilterEngine::new();
        engine.enable("a:*");
        engine.disable("-a:b");

        assert!(!engine.is_enabled("a:b"));
        assert_eq!(engine.names().len(), 1);
    }

    #[test]
    fn test_enable_persists_raw_spec() {
        let engine = FilterEngine::new();
        engine.enable("server:*,-server:debug");
        assert_eq!(engine.load().as_deref(), Some("server:*,-server:debug"));

        engine.disable("server:http");
        assert_eq!(engine.load().as_deref(), Some("server:http"));
    }

    #[test]
    fn test_from_store_loads_spec() {
        let engine = FilterEngine::from_store(MemoryStore::new("db:*,-db:secret"));
        assert!(engine.is_enabled("db:query"));
        assert!(!engine.is_enabled("db:secret"));
        assert_eq!(engine.load().as_deref(), Some("db:*,-db:secret"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let engine = FilterEngine::new();
        engine.enable("a b,c");

        let before = engine.load();
        engine.save(before.as_deref());
        assert_eq!(engine.load(), before);

        engine.save(None);
        assert_eq!(engine.load(), None);
    }

    #[test]
    fn test_disable_all_keeps_skip_history() {
        // disable_all only clears the persisted spec; accumulated patterns survive.
        let engine = FilterEngine::new();
        engine.enable("a:*,-a:secret");
        engine.disable("b");

        engine.disable_all();

        assert_eq!(engine.load().as_deref(), Some(""));
        assert_eq!(
            engine.skips(),
            vec!["^a:secret$".to_string(), "^b$".to_string()]
        );
        assert!(engine.is_enabled("a:public"));
        assert!(!engine.is_enabled("a:secret"));
        assert!(!engine.is_enabled("b"));
    }

    #[test]
    fn test_events_carry_raw_tokens() {
        let engine = FilterEngine::new();
        let events = Arc::new(Mutex::new(vec![]));
        let _sub = {
            let events = events.clone();
            engine.subscribe(move |event| {
                events.lock().push((event.kind(), event.namespace().to_owned()))
            })
        };

        engine.enable("a:*, -a:b  c");
        engine.disable("c,-d");

        assert_eq!(
            *events.lock(),
            vec![
                (ChangeKind::Enable, "a:*".to_string()),
                (ChangeKind::Enable, "c".to_string()),
                (ChangeKind::Disable, "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_subscriber_may_query_engine() {
        let engine = FilterEngine::new();
        let seen = Arc::new(Mutex::new(vec![]));
        let _sub = {
            let engine = engine.clone();
            let seen = seen.clone();
            engine.clone().subscribe(move |event| {
                seen.lock().push(engine.is_enabled(event.namespace()));
            })
        };

        engine.enable("a");
        engine.disable("a");
        assert_eq!(*seen.lock(), vec![true, false]);
    }

    #[test]
    fn test_global_engine_leaves_environment_alone() {
        let before = std::env::var(DEFAULT_SPEC_ENV).ok();

        let workers = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    FilterEngine::global().enable(&format!("req:{i}"));
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(FilterEngine::global().is_enabled("req:3"));
        assert_eq!(std::env::var(DEFAULT_SPEC_ENV).ok(), before);

        FilterEngine::global().disable_all();
        assert_eq!(FilterEngine::global().load().as_deref(), Some(""));
        assert_eq!(std::env::var(DEFAULT_SPEC_ENV).ok(), before);
    }
}
