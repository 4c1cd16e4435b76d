//! Citation list files and batch selection.

use super::entities::Citation;
use crate::core::error::DomainError;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Parse one citation per non-empty line; `#` starts a comment line.
pub fn parse_citation_list(text: &str) -> Vec<Citation> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| Citation::parse(line).ok())
        .collect()
}

/// 1-based inclusive batch such as `101-115`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    pub fn as_range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl FromStr for BatchRange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DomainError::InvalidCitation(format!("invalid range '{s}' (expected A-B, e.g. 101-115)"))
        };
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s.trim(), s.trim()),
        };
        let start: usize = start.parse().map_err(|_| invalid())?;
        let end: usize = end.parse().map_err(|_| invalid())?;
        if start == 0 || end < start {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

/// Select the citations at 1-based positions `range`, keeping their positions.
///
/// Positions past the end of the list are ignored.
pub fn select_batch(citations: &[Citation], range: BatchRange) -> Vec<(usize, Citation)> {
    citations
        .iter()
        .enumerate()
        .map(|(i, c)| (i + 1, c))
        .filter(|(index, _)| range.as_range().contains(index))
        .map(|(index, c)| (index, c.clone()))
        .collect()
}
