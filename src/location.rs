use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

mod humanizer;
pub use humanizer::Humanizer;

#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// A half-open range of source locations.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Located<T> {
    pub locatee: T,
    pub span: SourceSpan,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(&self, other: &SourceSpan) -> Self {
        Self { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    /// Whether the spans overlap or touch. An empty span, such as a cursor
    /// position, intersects the spans it is in or next to.
    pub fn intersects(&self, other: &SourceSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl<T> Located<T> {
    pub fn new(locatee: T, span: SourceSpan) -> Self {
        Self { locatee, span }
    }
}

// `Display` implementations

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NOTE(MH): Internally, positions are zero-based. The user gets to see
        // them one-based though.
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// `Debug` implementations

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

// Parsing of the one-based `line:column-line:column` notation used by
// `Display` and by the serialized form.

impl FromStr for SourceLocation {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bad = || format!("bad source location `{}`", input);
        let (line, column) = input.split_once(':').ok_or_else(bad)?;
        let line: u32 = line.trim().parse().map_err(|_| bad())?;
        let column: u32 = column.trim().parse().map_err(|_| bad())?;
        if line == 0 || column == 0 {
            return Err(bad());
        }
        Ok(Self::new(line - 1, column - 1))
    }
}

impl FromStr for SourceSpan {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (start, end) =
            input.split_once('-').ok_or_else(|| format!("bad source span `{}`", input))?;
        Ok(Self::new(start.parse()?, end.parse()?))
    }
}

impl Serialize for SourceSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = String::deserialize(deserializer)?;
        input.parse().map_err(serde::de::Error::custom)
    }
}
