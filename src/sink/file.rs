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
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use parking_lot::Mutex;

use crate::Error;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;
use crate::sink::Sink;

/// A sink that appends log records to a single file.
///
/// Parent directories are created on open. Rotation is left to external tools.
///
/// # Examples
///
/// ```no_run
/// use debugforth::sink::SingleFile;
///
/// let file = SingleFile::open("/var/log/app/debug.log").unwrap();
/// ```
#[derive(Debug)]
pub struct SingleFile {
    path: PathBuf,
    writer: Mutex<File>,
    layout: Box<dyn Layout>,
}

impl SingleFile {
    /// Open the file for appending, with an uncolored text layout.
    pub fn open(path: impl Into<PathBuf>) -> Result<SingleFile, Error> {
        let path = path.into();
        let writer = open_append(&path).map_err(|err| {
            Error::new("failed to open log file")
                .with_context("path", path.display())
                .with_source(err)
        })?;

        Ok(SingleFile {
            path,
            writer: Mutex::new(writer),
            layout: Box::new(TextLayout::default().no_color()),
        })
    }

    /// Set the layout.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// The path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).context("failed to create log directory")?;
    }
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .context("failed to create log file")
}

impl Sink for SingleFile {
    fn log(&self, record: &Record) -> Result<bool, Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        self.writer
            .lock()
            .write_all(&bytes)
            .map_err(|err| Error::from_io_error(err).with_context("path", self.path.display()))?;
        Ok(true)
    }

    fn flush(&self) -> Result<(), Error> {
        self.writer.lock().flush().map_err(Error::from_io_error)
    }
}
