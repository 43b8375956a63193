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

use crate::ALWAYS_ON_NAMESPACE;
use crate::Level;
use crate::Logger;
use crate::LoggerFactory;
use crate::record::Metadata;

/// Forwards records of the [`log`] crate to namespace loggers.
///
/// The record target becomes the namespace, with `::` rewritten to `:`, so `my_crate::db`
/// logs through the `my_crate:db` logger. Key-values become metadata.
#[derive(Debug, Clone)]
pub struct LogBridge {
    factory: LoggerFactory,
}

impl LogBridge {
    /// Create a bridge routing to loggers of the given factory.
    pub fn new(factory: LoggerFactory) -> Self {
        Self { factory }
    }

    // a disabled target must not go through the factory, which would create a throwaway stub
    fn logger_for(&self, target: &str) -> Option<Logger> {
        let namespace = namespace_of(target);
        if let Some(logger) = self.factory.cached(&namespace) {
            return logger.is_enabled().then_some(logger);
        }
        if namespace == ALWAYS_ON_NAMESPACE || self.factory.engine().is_enabled(&namespace) {
            return Some(self.factory.logger(&namespace));
        }
        None
    }
}

fn namespace_of(target: &str) -> String {
    target.replace("::", ":")
}

struct MetadataCollector<'a> {
    metadata: &'a mut Metadata,
}

impl<'kvs> log::kv::VisitSource<'kvs> for MetadataCollector<'_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let value = serde_json::to_value(&value).unwrap_or_else(|_| value.to_string().into());
        self.metadata.insert(key.to_string(), value);
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let namespace = namespace_of(metadata.target());
        match self.factory.cached(&namespace) {
            Some(logger) => logger.is_enabled(),
            None => {
                namespace == ALWAYS_ON_NAMESPACE || self.factory.engine().is_enabled(&namespace)
            }
        }
    }

    fn log(&self, record: &log::Record) {
        let Some(logger) = self.logger_for(record.target()) else {
            return;
        };

        let mut metadata = Metadata::new();
        let mut collector = MetadataCollector {
            metadata: &mut metadata,
        };
        // a failing key-value source loses its remaining pairs, not the record
        let _ = record.key_values().visit(&mut collector);

        logger.log_with(Level::from(record.level()), record.args(), &metadata);
    }

    fn flush(&self) {
        self.factory.registry().flush();
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] with a [`LogBridge`], so all logs from the log
/// crate are forwarded to loggers of the given factory.
///
/// This should be called early in the execution of a Rust program. Any log events that occur
/// before initialization will be ignored.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn setup_log_crate(factory: LoggerFactory) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(factory)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
