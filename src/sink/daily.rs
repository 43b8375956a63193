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
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use parking_lot::Mutex;

use crate::Error;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;
use crate::sink::Sink;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A sink that appends log records to one file per day.
///
/// Records go to `{dir}/{name}.{YYYY-MM-DD}.log`. The first record written after midnight, in the
/// sink's time zone, opens the file of the new day. When [`DailyFileBuilder::max_log_files`] is
/// set, the oldest files of this sink are deleted whenever a file is opened.
///
/// # Examples
///
/// ```no_run
/// use debugforth::sink::DailyFile;
///
/// let daily = DailyFile::builder("/var/log/app", "debug")
///     .max_log_files(14)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct DailyFile {
    writer: Mutex<DailyWriter>,
    layout: Box<dyn Layout>,
}

impl DailyFile {
    /// Create a builder writing files named after `name` into `dir`.
    pub fn builder(dir: impl Into<PathBuf>, name: impl Into<String>) -> DailyFileBuilder {
        DailyFileBuilder {
            dir: dir.into(),
            name: name.into(),
            max_files: None,
            tz: TimeZone::system(),
            layout: Box::new(TextLayout::default().no_color()),
            clock: Clock::System,
        }
    }

    /// The path of the file currently written.
    pub fn current_path(&self) -> PathBuf {
        self.writer.lock().path()
    }
}

impl Sink for DailyFile {
    fn log(&self, record: &Record) -> Result<bool, Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');

        let mut writer = self.writer.lock();
        writer.write(&bytes).map_err(|err| {
            Error::new("failed to write daily log file")
                .with_context("path", writer.path().display())
                .with_source(err)
        })?;
        Ok(true)
    }

    fn flush(&self) -> Result<(), Error> {
        self.writer
            .lock()
            .file
            .flush()
            .map_err(Error::from_io_error)
    }
}

/// A builder for [`DailyFile`].
#[must_use = "call `build` to open the file"]
#[derive(Debug)]
pub struct DailyFileBuilder {
    dir: PathBuf,
    name: String,
    max_files: Option<usize>,
    tz: TimeZone,
    layout: Box<dyn Layout>,
    clock: Clock,
}

impl DailyFileBuilder {
    /// Keep at most `n` files of this sink, the current one included. At least one is kept.
    pub fn max_log_files(mut self, n: usize) -> Self {
        self.max_files = Some(n.max(1));
        self
    }

    /// Set the time zone deciding where days start. Defaults to the system time zone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = tz;
        self
    }

    /// Set the layout. Defaults to an uncolored [`TextLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Create the directory if needed and open the file of the current day.
    pub fn build(self) -> Result<DailyFile, Error> {
        let Self {
            dir,
            name,
            max_files,
            tz,
            layout,
            clock,
        } = self;

        let context = dir.display().to_string();
        let writer = DailyWriter::open(dir, name, max_files, tz, clock).map_err(|err| {
            Error::new("failed to open daily log file")
                .with_context("dir", context)
                .with_source(err)
        })?;

        Ok(DailyFile {
            writer: Mutex::new(writer),
            layout,
        })
    }
}

#[derive(Debug)]
enum Clock {
    System,
    #[cfg(test)]
    Manual(Timestamp),
}

impl Clock {
    fn now(&self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Manual(now) => *now,
        }
    }

    #[cfg(test)]
    fn set_now(&mut self, now: Timestamp) {
        if let Clock::Manual(current) = self {
            *current = now;
        }
    }
}

#[derive(Debug)]
struct DailyWriter {
    dir: PathBuf,
    name: String,
    max_files: Option<usize>,
    tz: TimeZone,
    clock: Clock,
    day: Date,
    next_rollover: Timestamp,
    file: File,
}

impl DailyWriter {
    fn open(
        dir: PathBuf,
        name: String,
        max_files: Option<usize>,
        tz: TimeZone,
        clock: Clock,
    ) -> anyhow::Result<DailyWriter> {
        fs::create_dir_all(&dir).context("failed to create log directory")?;

        let (day, next_rollover) = day_bounds(clock.now(), &tz)?;
        let file = open_append(&dir.join(file_name(&name, day)))?;
        let writer = DailyWriter {
            dir,
            name,
            max_files,
            tz,
            clock,
            day,
            next_rollover,
            file,
        };
        writer.prune();
        Ok(writer)
    }

    fn path(&self) -> PathBuf {
        self.dir.join(file_name(&self.name, self.day))
    }

    fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        let now = self.clock.now();
        if now >= self.next_rollover {
            self.roll(now)?;
        }
        self.file
            .write_all(bytes)
            .context("failed to write log file")
    }

    fn roll(&mut self, now: Timestamp) -> anyhow::Result<()> {
        let (day, next_rollover) = day_bounds(now, &self.tz)?;
        let file = open_append(&self.dir.join(file_name(&self.name, day)))?;
        self.file
            .flush()
            .context("failed to flush previous log file")?;

        self.file = file;
        self.day = day;
        self.next_rollover = next_rollover;
        self.prune();
        Ok(())
    }

    fn prune(&self) {
        if let Some(max_files) = self.max_files {
            if let Err(err) = self.delete_oldest(max_files) {
                eprintln!("failed to delete oldest logs: {err:#}");
            }
        }
    }

    fn delete_oldest(&self, max_files: usize) -> anyhow::Result<()> {
        let read_dir = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read log dir: {}", self.dir.display()))?;

        // only files named by this sink; anything else in the directory is left alone
        let mut files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.file_type().ok()?.is_file() {
                    return None;
                }
                let day = parse_day(&self.name, entry.file_name().to_str()?)?;
                Some((day, entry.path()))
            })
            .collect::<Vec<_>>();

        if files.len() <= max_files {
            return Ok(());
        }

        files.sort_by_key(|(day, _)| *day);
        let excess = files.len() - max_files;
        for (_, path) in files.iter().take(excess) {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove old log file {}", path.display()))?;
        }
        Ok(())
    }
}

fn day_bounds(now: Timestamp, tz: &TimeZone) -> anyhow::Result<(Date, Timestamp)> {
    let day = now.to_zoned(tz.clone()).date();
    let next = day.tomorrow()?.to_zoned(tz.clone())?.timestamp();
    Ok((day, next))
}

fn file_name(name: &str, day: Date) -> String {
    format!("{name}.{}.log", day.strftime(DATE_FORMAT))
}

fn parse_day(name: &str, file_name: &str) -> Option<Date> {
    let date = file_name
        .strip_prefix(name)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    Date::strptime(DATE_FORMAT, date).ok()
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .context("failed to create log file")
}
