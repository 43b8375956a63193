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

use std::io::Write;

use crate::Error;
use crate::Level;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;
use crate::sink::Sink;

/// A sink that prints log records to stdout, and records of selected levels to stderr.
///
/// By default, only `error` records go to stderr.
///
/// # Examples
///
/// ```
/// use debugforth::Level;
/// use debugforth::sink::Console;
///
/// let console = Console::default().stderr_levels([Level::Error, Level::Critical]);
/// ```
#[derive(Debug)]
pub struct Console {
    layout: Box<dyn Layout>,
    stderr_levels: Vec<Level>,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            layout: Box::new(TextLayout::default()),
            stderr_levels: vec![Level::Error],
        }
    }
}

impl Console {
    /// Set the layout.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the levels written to stderr instead of stdout.
    pub fn stderr_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.stderr_levels = levels.into_iter().collect();
        self
    }

    fn use_stderr(&self, level: Level) -> bool {
        self.stderr_levels.contains(&level)
    }
}

impl Sink for Console {
    fn log(&self, record: &Record) -> Result<bool, Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        if self.use_stderr(record.level()) {
            std::io::stderr()
                .write_all(&bytes)
                .map_err(Error::from_io_error)?;
        } else {
            std::io::stdout()
                .write_all(&bytes)
                .map_err(Error::from_io_error)?;
        }
        Ok(true)
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)?;
        std::io::stderr().flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_levels() {
        let console = Console::default();
        assert!(console.use_stderr(Level::Error));
        assert!(!console.use_stderr(Level::Critical));
        assert!(!console.use_stderr(Level::Info));

        let console = console.stderr_levels([Level::Warn]);
        assert!(console.use_stderr(Level::Warn));
        assert!(!console.use_stderr(Level::Error));
    }

    #[test]
    fn test_console_handles_record() {
        let console = Console::default().with_layout(TextLayout::default().no_color());
        let record = Record::new("test:console", Level::Debug, &"hello");
        assert!(console.log(&record).unwrap());
    }
}
