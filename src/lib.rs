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

//! Debugforth is a namespace-scoped logging facade: callers obtain a logger bound to a name such
//! as `db:query`, and a separate filter engine decides which namespaces are enabled.
//!
//! # Overview
//!
//! Namespaces are enabled with a spec such as `server:*,-server:debug`: a `*` matches anything
//! and a leading `-` skips matching namespaces, whatever else enables them. The spec can be
//! changed at runtime and loggers that already exist follow the change.
//!
//! Each logger dispatches to a [`TransportRegistry`](transport::TransportRegistry), which holds
//! sinks grouped by transport kind, each with its own minimum level. Within a transport, sinks are
//! tried in order until one handles the record.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use debugforth::LoggerFactory;
//! use debugforth::filter::FilterEngine;
//! use debugforth::sink::Console;
//! use debugforth::transport::TransportKind;
//! use debugforth::transport::TransportRegistry;
//!
//! let engine = FilterEngine::new();
//! engine.enable("server:*,-server:debug");
//!
//! let registry = TransportRegistry::builder()
//!     .sink(TransportKind::Console, Console::default())
//!     .build();
//! let factory = LoggerFactory::new(engine.clone(), Arc::new(registry));
//!
//! let http = factory.logger("server:http");
//! http.info("listening");
//!
//! engine.disable("server:http");
//! assert!(!http.info("this is dropped"));
//! ```
//!
//! The process-wide [`logger`] reads the `DEBUG` environment variable on first use:
//!
//! ```
//! let log = debugforth::logger("APP");
//! log.info("the APP namespace is always on");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod bus;
pub mod color;
pub mod config;
pub mod filter;
pub mod layout;
pub mod sink;
pub mod transport;
pub mod trap;

mod error;
pub use self::error::Error;

mod level;
pub use self::level::Level;

mod record;
pub use self::record::Metadata;
pub use self::record::Record;

mod logger;
pub use self::logger::ALWAYS_ON_NAMESPACE;
pub use self::logger::HORIZONTAL_RULE;
pub use self::logger::Logger;
pub use self::logger::LoggerFactory;
pub use self::logger::logger;
