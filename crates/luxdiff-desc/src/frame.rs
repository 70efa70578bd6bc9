//! Inclusive frame ranges.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` frame range.
///
/// Kept as a tuple struct rather than named fields so that it serializes
/// as a 2-item JSON array `[start, end]` instead of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameRange(pub i64, pub i64);

impl FrameRange {
    /// Range covering a single frame.
    pub fn single(frame: i64) -> Self {
        Self(frame, frame)
    }

    pub fn start(&self) -> i64 {
        self.0
    }

    pub fn end(&self) -> i64 {
        self.1
    }

    pub fn num_frames(&self) -> i64 {
        self.1 - self.0 + 1
    }

    pub fn contains(&self, frame: i64) -> bool {
        self.0 <= frame && frame <= self.1
    }

    pub fn is_superset(&self, other: &FrameRange) -> bool {
        self.0 <= other.0 && other.1 <= self.1
    }

    pub fn is_subset(&self, other: &FrameRange) -> bool {
        other.is_superset(self)
    }

    /// Iterates over every frame in the range, endpoints included.
    pub fn iter_frames(&self) -> impl Iterator<Item = i64> {
        self.0..=self.1
    }

    /// Compact form for report text: `12-20`, or just `12` for a
    /// single-frame range.
    pub fn display_str(&self) -> String {
        if self.0 == self.1 {
            self.0.to_string()
        } else {
            format!("{}-{}", self.0, self.1)
        }
    }
}

impl std::fmt::Display for FrameRange {
    /// Formatting suitable for frame-range tool arguments (`start:end`).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl FromStr for FrameRange {
    type Err = String;

    /// Parses `N` (single frame) or `N:M` (inclusive range).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|e| format!("bad frame number {:?}: {}", part, e))
        };
        match s.split_once(':') {
            Some((start, end)) => {
                if end.contains(':') {
                    return Err(format!(
                        "frames may only have a single ':', to denote start:end (inclusive) - got: {}",
                        s
                    ));
                }
                Ok(Self(parse(start)?, parse(end)?))
            }
            None => {
                let frame = parse(s)?;
                Ok(Self::single(frame))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basics() {
        let r = FrameRange(1, 10);
        assert_eq!(r.num_frames(), 10);
        assert!(r.contains(1));
        assert!(r.contains(10));
        assert!(!r.contains(11));
        assert!(r.is_superset(&FrameRange(2, 9)));
        assert!(FrameRange(2, 9).is_subset(&r));
        assert!(!r.is_superset(&FrameRange(0, 5)));
    }

    #[test]
    fn test_iter_frames() {
        assert_eq!(FrameRange(3, 6).iter_frames().collect::<Vec<_>>(), vec![3, 4, 5, 6]);
        assert_eq!(FrameRange::single(4).iter_frames().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameRange(1, 10).to_string(), "1:10");
        assert_eq!(FrameRange(1, 10).display_str(), "1-10");
        assert_eq!(FrameRange::single(7).display_str(), "7");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("5".parse::<FrameRange>().unwrap(), FrameRange(5, 5));
        assert_eq!("1:20".parse::<FrameRange>().unwrap(), FrameRange(1, 20));
        assert!("1:2:3".parse::<FrameRange>().is_err());
        assert!("abc".parse::<FrameRange>().is_err());
    }

    #[test]
    fn test_serializes_as_pair() {
        let json = serde_json::to_string(&FrameRange(11, 20)).unwrap();
        assert_eq!(json, "[11,20]");
        let back: FrameRange = serde_json::from_str("[11,20]").unwrap();
        assert_eq!(back, FrameRange(11, 20));
    }
}
