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

use std::fmt;

use regex::Regex;

use crate::Error;

/// A namespace pattern compiled from one token of an enable spec.
///
/// Each `*` matches any sequence of characters; everything else matches literally. The pattern
/// must match the whole namespace.
///
/// Two patterns are equal when their compiled forms are equal, so `a:*` compiled twice yields
/// equal patterns.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a namespace token into a pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use debugforth::filter::Pattern;
    ///
    /// let pattern = Pattern::compile("server:*").unwrap();
    /// assert!(pattern.matches("server:http"));
    /// assert!(!pattern.matches("client:http"));
    /// ```
    pub fn compile(token: &str) -> Result<Pattern, Error> {
        let mut source = String::with_capacity(token.len() + 2);
        source.push('^');
        for (i, part) in token.split('*').enumerate() {
            if i > 0 {
                source.push_str(".*?");
            }
            source.push_str(&regex::escape(part));
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| {
            Error::new("failed to compile namespace pattern")
                .with_context("token", token)
                .with_source(err)
        })?;
        Ok(Pattern { regex })
    }

    /// Whether this pattern matches the whole namespace.
    pub fn matches(&self, namespace: &str) -> bool {
        self.regex.is_match(namespace)
    }

    /// The compiled form of this pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self.as_str())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One token of an enable spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive<'a> {
    Allow(&'a str),
    Skip(&'a str),
}

/// Split an enable spec into directives.
///
/// Tokens are separated by runs of whitespace or commas. Empty tokens, and a bare `-`, are
/// dropped.
pub(crate) fn parse_spec(spec: &str) -> impl Iterator<Item = Directive<'_>> {
    spec.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.strip_prefix('-') {
            Some("") => None,
            Some(rest) => Some(Directive::Skip(rest)),
            None => Some(Directive::Allow(token)),
        })
}

/// The accumulated allow and skip patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    allow: Vec<Pattern>,
    skip: Vec<Pattern>,
}

impl PatternSet {
    /// Whether the namespace is enabled.
    ///
    /// Any skip match disables the namespace regardless of allow matches.
    pub fn is_enabled(&self, namespace: &str) -> bool {
        if self.skip.iter().any(|p| p.matches(namespace)) {
            return false;
        }
        self.allow.iter().any(|p| p.matches(namespace))
    }

    /// The allow patterns, in insertion order.
    pub fn allow(&self) -> &[Pattern] {
        &self.allow
    }

    /// The skip patterns, in insertion order.
    pub fn skip(&self) -> &[Pattern] {
        &self.skip
    }

    pub(crate) fn push_allow(&mut self, pattern: Pattern) {
        self.allow.push(pattern);
    }

    pub(crate) fn push_skip(&mut self, pattern: Pattern) {
        self.skip.push(pattern);
    }

    // exact compiled-form match only; a wildcard allow is not revoked by a narrower token
    pub(crate) fn revoke(&mut self, pattern: &Pattern) {
        self.allow.retain(|p| p != pattern);
    }
}
