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

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::Serialize;

use crate::Error;
use crate::Level;
use crate::layout::Layout;
use crate::record::Metadata;
use crate::record::Record;

/// A JSON layout for formatting log records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"error","namespace":"db:query","message":"connection refused","meta":{"port":5432}}
/// {"timestamp":"2024-08-11T22:44:57.172187+08:00","level":"debug","namespace":"server","message":"----","raw":true}
/// ```
///
/// # Examples
///
/// ```
/// use debugforth::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Sets the timezone for timestamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use debugforth::layout::JsonLayout;
    /// use jiff::tz::TimeZone;
    ///
    /// let json_layout = JsonLayout::default().timezone(TimeZone::UTC);
    /// ```
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

#[derive(Serialize)]
struct RecordLine<'a> {
    timestamp: String,
    level: Level,
    namespace: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Metadata>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    raw: bool,
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let ts = Timestamp::try_from(record.time())
            .map_err(|err| Error::new("failed to convert record time").with_source(err))?;
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        let timestamp = ts
            .to_zoned(tz)
            .strftime("%Y-%m-%dT%H:%M:%S.%6f%:z")
            .to_string();

        let line = RecordLine {
            timestamp,
            level: record.level(),
            namespace: record.namespace(),
            message: record.message().to_string(),
            meta: record.metadata(),
            raw: record.is_raw(),
        };

        serde_json::to_vec(&line)
            .map_err(|err| Error::new("failed to serialize record").with_source(err))
    }
}
