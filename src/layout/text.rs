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

use std::fmt::Write;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Error;
use crate::color::LevelColor;
use crate::color::paint;
use crate::layout::Layout;
use crate::record::Record;

/// A layout that formats log records as human-readable text.
///
/// Output format:
///
/// ```text
/// [2024/08/11 10:44:57][INFO][server:http] listening
/// [2024/08/11 10:44:57][ERROR][db:query] connection refused
///     {"host":"localhost","port":5432}
/// [server:http] ------------------------------------------------------------
/// ```
///
/// Metadata, when present, follows the message on an indented line as JSON. Raw records, such as
/// horizontal rules, are printed with only the namespace label.
///
/// The namespace label takes the color assigned to its logger. Messages are colored by level;
/// see [`LevelColor`]. Colors can be turned off with [`TextLayout::no_color`].
///
/// # Examples
///
/// ```
/// use debugforth::layout::TextLayout;
///
/// let layout = TextLayout::default().no_color();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    colors: LevelColor,
    no_color: bool,
    tz: Option<TimeZone>,
}

impl TextLayout {
    /// Disable colored output.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// Customize the colors.
    pub fn colors(mut self, colors: LevelColor) -> Self {
        self.colors = colors;
        self
    }

    /// Set the timezone for timestamps. Defaults to the system timezone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    fn timestamp(&self, record: &Record) -> Result<String, Error> {
        let ts = Timestamp::try_from(record.time())
            .map_err(|err| Error::new("failed to convert record time").with_source(err))?;
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        Ok(ts.to_zoned(tz).strftime("[%Y/%m/%d %I:%M:%S]").to_string())
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let label = paint(
            self.no_color,
            &format!("[{}]", record.namespace()),
            record.label_color(),
        );

        let mut text = String::new();
        if record.is_raw() {
            write!(&mut text, "{label} {}", record.message()).map_err(Error::from_fmt_error)?;
            return Ok(text.into_bytes());
        }

        let level = record.level();
        let time = paint(
            self.no_color,
            &self.timestamp(record)?,
            Some(self.colors.timestamp),
        );
        let tag = paint(
            self.no_color,
            &format!("[{}]", level.as_str().to_uppercase()),
            Some(self.colors.tag(level)),
        );

        let mut body = record.message().to_string();
        if let Some(metadata) = record.metadata() {
            let json = serde_json::to_string(metadata)
                .map_err(|err| Error::new("failed to serialize metadata").with_source(err))?;
            write!(&mut body, "\n\t{json}").map_err(Error::from_fmt_error)?;
        }
        let body = paint(self.no_color, &body, Some(self.colors.message(level)));

        write!(&mut text, "{time}{tag}{label} {body}").map_err(Error::from_fmt_error)?;
        Ok(text.into_bytes())
    }
}
