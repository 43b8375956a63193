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

//! Color utilities.

use colored::Color;
use colored::Colorize;

use crate::Level;

/// Colors for the parts of a text line.
#[derive(Debug, Clone)]
pub struct LevelColor {
    /// Color for the timestamp, and for the level tag of debug records.
    pub timestamp: Color,
    /// Color for debug messages.
    pub debug: Color,
    /// Color for info messages.
    pub info: Color,
    /// Color for warning messages.
    pub warn: Color,
    /// Color for error messages.
    pub error: Color,
    /// Color for critical messages.
    pub critical: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            timestamp: Color::BrightBlack,
            debug: Color::BrightWhite,
            info: Color::Cyan,
            warn: Color::BrightYellow,
            error: Color::Red,
            critical: Color::BrightRed,
        }
    }
}

impl LevelColor {
    /// The color of messages at this level.
    pub fn message(&self, level: Level) -> Color {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
            Level::Critical => self.critical,
        }
    }

    /// The color of the level tag. Debug tags are dimmed like the timestamp.
    pub fn tag(&self, level: Level) -> Color {
        match level {
            Level::Debug => self.timestamp,
            level => self.message(level),
        }
    }
}

/// The palette namespace labels are assigned from, in rotation.
pub const LABEL_PALETTE: [Color; 8] = [
    Color::Green,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::BrightGreen,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
];

pub(crate) fn paint(no_color: bool, text: &str, color: Option<Color>) -> String {
    match color {
        Some(color) if !no_color => text.color(color).to_string(),
        _ => text.to_string(),
    }
}
