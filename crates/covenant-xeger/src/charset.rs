//! Character sets as sorted, disjoint, inclusive code point ranges.
//!
//! The universe is every Unicode scalar value, `U+0000..=U+10FFFF` without
//! the surrogate block, so every range converts losslessly to `char` bounds.

/// Largest code point the generator ever produces.
pub const MAX_CODE_POINT: u32 = 0x10_FFFF;

const SURROGATES: (u32, u32) = (0xD800, 0xDFFF);

/// Code points treated as whitespace by `\S`.
const UNICODE_WHITESPACE: &[(u32, u32)] = &[
    (0x09, 0x0D),
    (0x20, 0x20),
    (0x85, 0x85),
    (0xA0, 0xA0),
    (0x1680, 0x1680),
    (0x2000, 0x200A),
    (0x2028, 0x2029),
    (0x202F, 0x202F),
    (0x205F, 0x205F),
    (0x3000, 0x3000),
];

/// A set of characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    /// The empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every character the generator can produce.
    #[must_use]
    pub fn any() -> Self {
        Self {
            ranges: vec![(0, SURROGATES.0 - 1), (SURROGATES.1 + 1, MAX_CODE_POINT)],
        }
    }

    /// A single character.
    #[must_use]
    pub fn single(c: char) -> Self {
        Self::range(c, c)
    }

    /// The inclusive range `lo..=hi`, clipped to the universe.
    #[must_use]
    pub fn range(lo: char, hi: char) -> Self {
        Self::from_ranges(vec![(u32::from(lo), u32::from(hi))])
    }

    /// Builds a set from arbitrary ranges, normalising and clipping them.
    #[must_use]
    pub fn from_ranges(ranges: Vec<(u32, u32)>) -> Self {
        let mut set = Self { ranges };
        set.normalize();
        set.intersect(&Self::any())
    }

    /// `[0-9]`
    #[must_use]
    pub fn digit() -> Self {
        Self::range('0', '9')
    }

    /// `[A-Za-z0-9_]`
    #[must_use]
    pub fn word() -> Self {
        Self::from_ranges(vec![
            (u32::from('0'), u32::from('9')),
            (u32::from('A'), u32::from('Z')),
            (u32::from('_'), u32::from('_')),
            (u32::from('a'), u32::from('z')),
        ])
    }

    /// `[ \t\r\n]`
    #[must_use]
    pub fn space() -> Self {
        Self::from_ranges(vec![(0x09, 0x0A), (0x0D, 0x0D), (0x20, 0x20)])
    }

    /// Complement of every Unicode whitespace character.
    #[must_use]
    pub fn non_space() -> Self {
        Self::from_ranges(UNICODE_WHITESPACE.to_vec()).negate()
    }

    /// Returns the ranges in ascending order.
    #[must_use]
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    /// Whether the set has no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether `c` is in the set.
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        let cp = u32::from(c);
        self.ranges.iter().any(|&(lo, hi)| lo <= cp && cp <= hi)
    }

    /// Set union.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        let mut set = Self { ranges };
        set.normalize();
        set
    }

    /// Complement within the universe.
    #[must_use]
    pub fn negate(&self) -> Self {
        let mut gaps = Vec::new();
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                gaps.push((next, lo - 1));
            }
            next = hi + 1;
        }
        if next <= MAX_CODE_POINT {
            gaps.push((next, MAX_CODE_POINT));
        }
        Self { ranges: gaps }.intersect(&Self::any())
    }

    /// Set intersection.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { ranges: out }
    }

    fn normalize(&mut self) {
        self.ranges.retain(|&(lo, hi)| lo <= hi);
        self.ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        self.ranges = merged;
    }
}
