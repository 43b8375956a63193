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

use std::sync::Arc;

use parking_lot::Mutex;

use crate::Error;
use crate::Level;
use crate::record::Metadata;
use crate::record::Record;
use crate::sink::Sink;

/// A record kept by a [`Capture`] sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    /// The namespace of the logger.
    pub namespace: String,
    /// The severity level.
    pub level: Level,
    /// The rendered message.
    pub message: String,
    /// The metadata, if any.
    pub metadata: Option<Metadata>,
    /// Whether the record was raw.
    pub raw: bool,
}

/// A sink that keeps records in memory.
///
/// Clones share the same buffer, so a clone can be kept to inspect what a registered sink saw.
///
/// # Examples
///
/// ```
/// use debugforth::sink::Capture;
///
/// let capture = Capture::default();
/// let inspector = capture.clone();
/// assert!(inspector.records().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Capture {
    records: Arc<Mutex<Vec<Captured>>>,
    handled: bool,
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            handled: true,
        }
    }
}

impl Capture {
    /// Set what this sink answers when offered a record. Defaults to `true`.
    pub fn handled(mut self, handled: bool) -> Self {
        self.handled = handled;
        self
    }

    /// The records seen so far.
    pub fn records(&self) -> Vec<Captured> {
        self.records.lock().clone()
    }

    /// The messages seen so far.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Forget the records seen so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Sink for Capture {
    fn log(&self, record: &Record) -> Result<bool, Error> {
        self.records.lock().push(Captured {
            namespace: record.namespace().to_owned(),
            level: record.level(),
            message: record.message().to_string(),
            metadata: record.metadata().cloned(),
            raw: record.is_raw(),
        });
        Ok(self.handled)
    }
}
