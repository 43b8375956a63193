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

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;

use debugforth::Error;
use debugforth::Level;
use debugforth::LoggerFactory;
use debugforth::Metadata;
use debugforth::Record;
use debugforth::config::RegistryConfig;
use debugforth::filter::FilterEngine;
use debugforth::sink::Capture;
use debugforth::sink::SingleFile;
use debugforth::sink::Sink;
use debugforth::sink::Testing;
use debugforth::transport::TransportKind;
use debugforth::transport::TransportRegistry;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_unhandled_console_falls_through_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.log");

    let console = Capture::default().handled(false);
    let fallback = Capture::default();
    let registry = TransportRegistry::builder()
        .sink(TransportKind::Console, console.clone())
        .sink(TransportKind::Console, fallback.clone())
        .sink(TransportKind::File, SingleFile::open(&path).unwrap())
        .build();

    let engine = FilterEngine::new();
    engine.enable("net:*");
    let factory = LoggerFactory::new(engine, Arc::new(registry));
    let log = factory.logger("net:tcp");

    assert!(log.info("connected"));
    assert_eq!(console.messages(), vec!["connected"]);
    assert_eq!(fallback.messages(), vec!["connected"]);

    log.flush();
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[INFO][net:tcp] connected"), "{written}");
}

#[test]
fn test_nobody_handles_record() {
    let silent = Capture::default().handled(false);
    let registry = TransportRegistry::builder()
        .sink(TransportKind::Http, silent.clone())
        .sink_with_level(TransportKind::Webhook, Level::Critical, Capture::default())
        .build();

    let engine = FilterEngine::new();
    engine.enable("hook");
    let factory = LoggerFactory::new(engine, Arc::new(registry));

    assert!(!factory.logger("hook").warn("unanswered"));
    assert_eq!(silent.messages(), vec!["unanswered"]);
}

#[test]
fn test_configured_registry_writes_metadata_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("debug.log");
    let json = format!(
        r#"{{ "transports": [
            {{ "kind": "file", "sinks": [{{ "type": "file", "level": "info", "path": {path:?} }}] }}
        ] }}"#,
        path = path.display().to_string(),
    );

    let registry = RegistryConfig::from_json(&json).unwrap().build().unwrap();
    let engine = FilterEngine::new();
    engine.enable("db:*");
    let factory = LoggerFactory::new(engine, Arc::new(registry));
    let log = factory.logger("db:query");

    let mut metadata = Metadata::new();
    metadata.insert("rows".to_owned(), json!(42));
    assert!(!log.debug("below the sink level"));
    assert!(log.log_with(Level::Error, "slow query", &metadata));
    log.flush();

    let written = fs::read_to_string(&path).unwrap();
    assert!(!written.contains("below the sink level"));
    assert!(written.contains("[ERROR][db:query] slow query\n\t{\"rows\":42}"), "{written}");
}

#[test]
fn test_set_level_through_handle_is_shared() {
    let capture = Capture::default();
    let registry = TransportRegistry::builder()
        .sink(TransportKind::Console, capture.clone())
        .build();
    let engine = FilterEngine::new();
    engine.enable("a,b");
    let factory = LoggerFactory::new(engine, Arc::new(registry));

    let a = factory.logger("a");
    let b = factory.logger("b");
    a.set_level(Level::Warn);

    assert_eq!(b.level(), Some(Level::Warn));
    assert!(!b.info("dropped"));
    assert!(b.error("kept"));
    assert_eq!(capture.messages(), vec!["kept"]);
}

#[test]
fn test_horizontal_rule_is_raw_debug() {
    let capture = Capture::default().handled(false);
    let registry = TransportRegistry::builder()
        .sink(TransportKind::Console, capture.clone())
        .sink(TransportKind::Console, Testing::default())
        .build();
    let factory = LoggerFactory::new(FilterEngine::new(), Arc::new(registry));

    let app = factory.logger(debugforth::ALWAYS_ON_NAMESPACE);
    assert!(app.hr());

    let records = capture.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].raw);
    assert_eq!(records[0].level, Level::Debug);
    assert_eq!(records[0].message, debugforth::HORIZONTAL_RULE);
}

#[derive(Debug, Default, Clone)]
struct Outbox {
    payloads: Arc<Mutex<Vec<String>>>,
}

impl Sink for Outbox {
    fn log(&self, record: &Record) -> Result<bool, Error> {
        let payload = json!({
            "namespace": record.namespace(),
            "level": record.level(),
            "message": record.message().to_string(),
        });
        self.payloads.lock().unwrap().push(payload.to_string());
        Ok(true)
    }
}

#[test]
fn test_application_sink_under_webhook_kind() {
    let outbox = Outbox::default();
    let registry = TransportRegistry::builder()
        .sink_with_level(TransportKind::Webhook, Level::Error, outbox.clone())
        .build();
    let engine = FilterEngine::new();
    engine.enable("billing");
    let factory = LoggerFactory::new(engine, Arc::new(registry));
    let log = factory.logger("billing");

    assert!(!log.warn("retrying charge"));
    assert!(log.critical("charge failed"));

    let payloads = outbox.payloads.lock().unwrap();
    assert_eq!(
        *payloads,
        vec![r#"{"level":"critical","message":"charge failed","namespace":"billing"}"#]
    );
}
