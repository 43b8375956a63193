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

use std::borrow::Cow;
use std::fmt;

use parking_lot::Mutex;

/// The default environment variable holding the enable spec.
pub const DEFAULT_SPEC_ENV: &str = "DEBUG";

/// Where the raw enable spec is persisted between runs.
pub trait SpecStore: fmt::Debug + Send + Sync + 'static {
    /// Load the previously persisted spec.
    fn load(&self) -> Option<String>;

    /// Persist a spec. `None` clears the persisted value.
    fn save(&self, spec: Option<&str>);
}

impl<T: SpecStore> From<T> for Box<dyn SpecStore> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A store that keeps the spec in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    spec: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create a store holding an initial spec.
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: Mutex::new(Some(spec.into())),
        }
    }
}

impl SpecStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.spec.lock().clone()
    }

    fn save(&self, spec: Option<&str>) {
        *self.spec.lock() = spec.map(str::to_owned);
    }
}

/// A store seeded from a process environment variable, `DEBUG` by default.
///
/// The variable is read once, when the store is created. Later saves are kept in memory and
/// never written back to the process environment, so enabling namespaces from worker threads
/// does not race with other readers of the environment.
#[derive(Debug)]
pub struct EnvStore {
    name: Cow<'static, str>,
    spec: MemoryStore,
}

impl Default for EnvStore {
    fn default() -> Self {
        EnvStore::new(DEFAULT_SPEC_ENV)
    }
}

impl EnvStore {
    /// Create a store seeded from the named variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use debugforth::filter::EnvStore;
    ///
    /// let store = EnvStore::new("MY_DEBUG");
    /// assert_eq!(store.name(), "MY_DEBUG");
    /// ```
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let spec = MemoryStore {
            spec: Mutex::new(std::env::var(&*name).ok()),
        };
        Self { name, spec }
    }

    /// The variable name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SpecStore for EnvStore {
    fn load(&self) -> Option<String> {
        self.spec.load()
    }

    fn save(&self, spec: Option<&str>) {
        self.spec.save(spec);
    }
}
