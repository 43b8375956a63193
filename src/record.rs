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

//! Log records.

use std::fmt;
use std::time::SystemTime;

use colored::Color;

use crate::Level;

/// Structured metadata attached to a log call.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The payload of a single log call, as seen by sinks and layouts.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    // the observed time
    now: SystemTime,

    namespace: &'a str,
    level: Level,
    message: &'a dyn fmt::Display,
    metadata: Option<&'a Metadata>,

    // rendering hints
    raw: bool,
    label_color: Option<Color>,
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("now", &self.now)
            .field("namespace", &self.namespace)
            .field("level", &self.level)
            .field("message", &self.message.to_string())
            .field("metadata", &self.metadata)
            .field("raw", &self.raw)
            .finish()
    }
}

impl<'a> Record<'a> {
    /// Create a record observed now.
    pub fn new(namespace: &'a str, level: Level, message: &'a dyn fmt::Display) -> Self {
        Self {
            now: SystemTime::now(),
            namespace,
            level,
            message,
            metadata: None,
            raw: false,
            label_color: None,
        }
    }

    /// Attach metadata. Empty maps are treated as absent.
    pub fn with_metadata(mut self, metadata: Option<&'a Metadata>) -> Self {
        self.metadata = metadata.filter(|m| !m.is_empty());
        self
    }

    /// Mark the record to be rendered raw, without timestamp or level decoration.
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Set the color of the namespace label.
    pub fn with_label_color(mut self, color: Option<Color>) -> Self {
        self.label_color = color;
        self
    }

    /// Override the observed time.
    pub fn with_time(mut self, now: SystemTime) -> Self {
        self.now = now;
        self
    }

    /// The observed time.
    pub fn time(&self) -> SystemTime {
        self.now
    }

    /// The namespace of the logger that produced this record.
    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// The severity level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message.
    pub fn message(&self) -> &'a dyn fmt::Display {
        self.message
    }

    /// The non-empty metadata map, if any.
    pub fn metadata(&self) -> Option<&'a Metadata> {
        self.metadata
    }

    /// Whether the record should skip timestamp and level decoration.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// The color assigned to the namespace label.
    pub fn label_color(&self) -> Option<Color> {
        self.label_color
    }
}
