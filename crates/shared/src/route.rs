//! Ordered, normalized route values.
//!
//! A [`Route`] never holds empty segments or segments containing the
//! delimiter: every constructor re-splits its input, so two routes that print
//! the same always compare equal.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::Tag;

pub const ROUTE_DELIMITER: char = '/';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Route {
    segments: Vec<String>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `/`-delimited path. Never fails: empty pieces and surrounding
    /// whitespace are dropped, so `"//a/ b /"` parses to `["a", "b"]`.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, ROUTE_DELIMITER)
    }

    /// Parses a path split on `delimiter`. The pieces are normalized like any
    /// other segments, so a `/` inside one still separates segments.
    pub fn parse_with(raw: &str, delimiter: char) -> Self {
        Self::from_segments(raw.split(delimiter))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut route = Self::new();
        route.extend(segments);
        route
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().map(String::as_str)
    }

    /// First `n` segments (the whole route when `n` exceeds its length).
    pub fn prefix(&self, n: usize) -> Route {
        Route {
            segments: self.segments.iter().take(n).cloned().collect(),
        }
    }

    /// Last `n` segments (the whole route when `n` exceeds its length).
    pub fn suffix(&self, n: usize) -> Route {
        let start = self.segments.len().saturating_sub(n);
        Route {
            segments: self.segments[start..].to_vec(),
        }
    }

    /// Everything after the first `n` segments.
    pub fn skip(&self, n: usize) -> Route {
        Route {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    /// Splits around the single occurrence of `tag`.
    ///
    /// The second half starts with the tag itself. Returns `None` when the tag
    /// is absent or occurs more than once.
    pub fn split(&self, tag: &Tag) -> Option<(Route, Route)> {
        let mut hits = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| tag.matches(segment))
            .map(|(index, _)| index);

        let index = hits.next()?;
        if hits.next().is_some() {
            return None;
        }

        Some((
            Route {
                segments: self.segments[..index].to_vec(),
            },
            Route {
                segments: self.segments[index..].to_vec(),
            },
        ))
    }

    pub fn concat(&self, other: &Route) -> Route {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Route { segments }
    }

    pub fn starts_with(&self, other: &Route) -> bool {
        self.segments.starts_with(&other.segments)
    }

    pub fn ends_with(&self, other: &Route) -> bool {
        self.segments.ends_with(&other.segments)
    }

    pub fn common_prefix_len(&self, other: &Route) -> usize {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    pub fn pushing(&self, segments: &Route) -> Route {
        self.concat(segments)
    }

    /// Removes `segments` from the end if the route ends with them; otherwise
    /// returns the route unchanged.
    pub fn popping(&self, segments: &Route) -> Route {
        if segments.is_empty() || !self.ends_with(segments) {
            return self.clone();
        }
        self.prefix(self.len() - segments.len())
    }

    pub fn to_string_with(&self, delimiter: char) -> String {
        let mut out = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                out.push(delimiter);
            }
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(ROUTE_DELIMITER))
    }
}

impl FromStr for Route {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(raw))
    }
}

impl<S: AsRef<str>> Extend<S> for Route {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for segment in iter {
            self.segments.extend(
                segment
                    .as_ref()
                    .split(ROUTE_DELIMITER)
                    .map(str::trim)
                    .filter(|piece| !piece.is_empty())
                    .map(str::to_string),
            );
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Route {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}

impl From<Vec<String>> for Route {
    fn from(value: Vec<String>) -> Self {
        Self::from_segments(value)
    }
}

impl From<&[&str]> for Route {
    fn from(value: &[&str]) -> Self {
        Self::from_segments(value.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Route {
    fn from(value: [&str; N]) -> Self {
        Self::from_segments(value)
    }
}

impl From<&Tag> for Route {
    fn from(value: &Tag) -> Self {
        Self::from_segments([value.as_str()])
    }
}

impl From<Route> for Vec<String> {
    fn from(value: Route) -> Self {
        value.segments
    }
}

impl<'a> IntoIterator for &'a Route {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
#[path = "tests/route_tests.rs"]
mod tests;
