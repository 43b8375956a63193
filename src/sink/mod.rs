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

//! Output sinks for log records.

use std::fmt;

use crate::Error;
use crate::record::Record;

mod capture;
mod console;
mod daily;
mod file;
mod testing;

pub use self::capture::Capture;
pub use self::capture::Captured;
pub use self::console::Console;
pub use self::daily::DailyFile;
pub use self::daily::DailyFileBuilder;
pub use self::file::SingleFile;
pub use self::testing::Testing;

/// A sink that can consume log records.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Offer a record to this sink.
    ///
    /// Returns `Ok(true)` if the sink consumed the record, which stops dispatch to the remaining
    /// sinks of the same transport.
    fn log(&self, record: &Record) -> Result<bool, Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Sink> From<T> for Box<dyn Sink> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
