use std::fmt;

// ── SpriteRange ─────────────────────────────────────────────────────────────

/// Inclusive span `[lo, hi]` of global sprite indices owned by one tilesheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpriteRange {
    pub lo: u32,
    pub hi: u32,
}

impl SpriteRange {
    /// Returns `None` when `lo > hi`.
    pub fn new(lo: u32, hi: u32) -> Option<Self> {
        (lo <= hi).then_some(Self { lo, hi })
    }

    pub fn contains(&self, index: u32) -> bool {
        self.lo <= index && index <= self.hi
    }

    pub fn overlaps(&self, other: &SpriteRange) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// Atlas-local index of `index`, or `None` when it is not in range.
    pub fn local_index(&self, index: u32) -> Option<u32> {
        self.contains(index).then(|| index - self.lo)
    }
}

impl fmt::Display for SpriteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.lo, self.hi)
    }
}

// ── parse_range ─────────────────────────────────────────────────────────────

/// Parse a spritesheet range comment such as `"range 12 to 340"`.
///
/// Accepted forms, case-insensitive and whitespace-tolerant:
/// - `range <lo> to <hi>`
/// - `range <lo> - <hi>`
/// - `range <lo>..<hi>`
///
/// Anything else, including `lo > hi`, yields `None` so the sheet owns no
/// indices.
pub fn parse_range(comment: &str) -> Option<SpriteRange> {
    let lower = comment.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("range")?.trim_start();

    let (lo, hi) = [" to ", "..", "-"]
        .iter()
        .find_map(|sep| rest.split_once(sep))?;

    let lo = lo.trim().parse().ok()?;
    let hi = hi.trim().parse().ok()?;
    SpriteRange::new(lo, hi)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_comment() {
        assert_eq!(parse_range("range 12 to 340"), SpriteRange::new(12, 340));
    }

    #[test]
    fn parses_with_odd_spacing_and_case() {
        assert_eq!(parse_range("  Range   0  to 99 "), SpriteRange::new(0, 99));
        assert_eq!(parse_range("RANGE 5 TO 5"), SpriteRange::new(5, 5));
    }

    #[test]
    fn parses_dash_and_dotted_separators() {
        assert_eq!(parse_range("range 100-199"), SpriteRange::new(100, 199));
        assert_eq!(parse_range("range 100 .. 199"), SpriteRange::new(100, 199));
    }

    #[test]
    fn malformed_comments_are_none() {
        assert_eq!(parse_range(""), None);
        assert_eq!(parse_range("tiles for furniture"), None);
        assert_eq!(parse_range("range twelve to 40"), None);
        assert_eq!(parse_range("range 12"), None);
        assert_eq!(parse_range("range -3 to 4"), None);
    }

    #[test]
    fn reversed_bounds_are_none() {
        assert_eq!(parse_range("range 40 to 12"), None);
    }

    #[test]
    fn contains_is_inclusive() {
        let r = SpriteRange::new(10, 19).unwrap();
        assert!(r.contains(10));
        assert!(r.contains(19));
        assert!(!r.contains(9));
        assert!(!r.contains(20));
    }

    #[test]
    fn local_index_subtracts_lower_bound() {
        let r = SpriteRange::new(100, 199).unwrap();
        assert_eq!(r.local_index(150), Some(50));
        assert_eq!(r.local_index(99), None);
    }

    #[test]
    fn overlap_detection() {
        let a = SpriteRange::new(0, 99).unwrap();
        let b = SpriteRange::new(100, 199).unwrap();
        let c = SpriteRange::new(99, 120).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
