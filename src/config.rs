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

//! Declarative transport configuration.
//!
//! ```
//! use debugforth::config::RegistryConfig;
//!
//! let config = RegistryConfig::from_json(
//!     r#"{
//!         "transports": [
//!             { "kind": "console", "sinks": [{ "type": "console", "level": "info" }] }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//! let registry = config.build().unwrap();
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::Error;
use crate::Level;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::sink::Console;
use crate::sink::DailyFile;
use crate::sink::SingleFile;
use crate::sink::Sink;
use crate::transport::TransportKind;
use crate::transport::TransportRegistry;

/// The configuration of a [`TransportRegistry`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// A top level overriding every sink level, applied after the sinks are built.
    #[serde(default)]
    pub level: Option<Level>,
    /// The transports, in dispatch order.
    #[serde(default)]
    pub transports: Vec<TransportConfig>,
}

/// The sinks of one transport kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// The transport kind.
    pub kind: TransportKind,
    /// The sinks, in dispatch order.
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// A sink descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// A [`Console`] sink.
    Console {
        /// The minimum level.
        #[serde(default = "default_level")]
        level: Level,
        /// Levels written to stderr. Defaults to `["error"]`.
        #[serde(default)]
        stderr_levels: Option<Vec<Level>>,
        /// Whether to colorize the output.
        #[serde(default = "default_color")]
        color: bool,
        /// Whether to write JSON lines.
        #[serde(default)]
        json: bool,
    },
    /// A [`DailyFile`] sink.
    Daily {
        /// The minimum level.
        #[serde(default = "default_level")]
        level: Level,
        /// The directory holding the files.
        dir: PathBuf,
        /// The file name prefix. Defaults to `debug`.
        #[serde(default = "default_daily_name")]
        name: String,
        /// How many files to keep. Defaults to keeping all of them.
        #[serde(default)]
        max_files: Option<usize>,
        /// Whether to write JSON lines.
        #[serde(default)]
        json: bool,
    },
    /// A [`SingleFile`] sink.
    File {
        /// The minimum level.
        #[serde(default = "default_level")]
        level: Level,
        /// The file path.
        path: PathBuf,
        /// Whether to write JSON lines.
        #[serde(default)]
        json: bool,
    },
}

fn default_level() -> Level {
    Level::Debug
}

fn default_daily_name() -> String {
    "debug".to_owned()
}

fn default_color() -> bool {
    true
}

fn layout(color: bool, json: bool) -> Result<Box<dyn Layout>, Error> {
    if json {
        #[cfg(feature = "layout-json")]
        return Ok(Box::new(crate::layout::JsonLayout::default()));
        #[cfg(not(feature = "layout-json"))]
        return Err(Error::new("json layout requires the `layout-json` feature"));
    }

    let text = TextLayout::default();
    Ok(if color {
        Box::new(text)
    } else {
        Box::new(text.no_color())
    })
}

impl SinkConfig {
    /// The minimum level of this sink.
    pub fn level(&self) -> Level {
        match self {
            SinkConfig::Console { level, .. }
            | SinkConfig::Daily { level, .. }
            | SinkConfig::File { level, .. } => *level,
        }
    }

    /// Build the sink.
    pub fn build(&self) -> Result<Box<dyn Sink>, Error> {
        match self {
            SinkConfig::Console {
                stderr_levels,
                color,
                json,
                ..
            } => {
                let mut console = Console::default().with_layout(layout(*color, *json)?);
                if let Some(levels) = stderr_levels {
                    console = console.stderr_levels(levels.iter().copied());
                }
                Ok(Box::new(console))
            }
            SinkConfig::Daily {
                dir,
                name,
                max_files,
                json,
                ..
            } => {
                let mut daily =
                    DailyFile::builder(dir, name.as_str()).layout(layout(false, *json)?);
                if let Some(n) = max_files {
                    daily = daily.max_log_files(*n);
                }
                Ok(Box::new(daily.build()?))
            }
            SinkConfig::File { path, json, .. } => {
                let file = SingleFile::open(path)?.with_layout(layout(false, *json)?);
                Ok(Box::new(file))
            }
        }
    }
}

impl RegistryConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|err| Error::new("failed to parse transport configuration").with_source(err))
    }

    /// Build the registry. Fails if any sink cannot be built.
    pub fn build(&self) -> Result<TransportRegistry, Error> {
        let mut builder = TransportRegistry::builder();
        for transport in &self.transports {
            for sink in &transport.sinks {
                let built = sink
                    .build()
                    .map_err(|err| err.with_context("transport", transport.kind))?;
                builder = builder.sink_with_level(transport.kind, sink.level(), built);
            }
        }

        let registry = builder.build();
        if let Some(level) = self.level {
            registry.set_level(level);
        }
        Ok(registry)
    }
}
