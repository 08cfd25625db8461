use std::fmt;

use crate::utils::iter_join;

/// A `sequence-set` as defined in [RFC 3501 section 9](https://tools.ietf.org/html/rfc3501#section-9):
/// one or more message numbers or UIDs, requested in a single command.
///
/// Numbers are kept sorted and de-duplicated, and consecutive runs are collapsed into ranges, so
/// `{9, 1, 2, 3, 10, 7}` renders as `1:3,7,9:10`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SequenceSet {
    ranges: Vec<(u32, u32)>,
}

impl SequenceSet {
    /// The contiguous range `from:to`, both ends inclusive.
    pub fn range(from: u32, to: u32) -> Self {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        SequenceSet {
            ranges: vec![(from, to)],
        }
    }

    /// Collapse a set of discrete numbers into ranges.
    pub fn from_nums<I: IntoIterator<Item = u32>>(nums: I) -> Self {
        let mut nums: Vec<u32> = nums.into_iter().collect();
        nums.sort_unstable();
        nums.dedup();

        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for n in nums {
            match ranges.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(n) => *end = n,
                _ => ranges.push((n, n)),
            }
        }
        SequenceSet { ranges }
    }

    /// True if the set contains no numbers at all.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether `n` is covered by the set.
    pub fn contains(&self, n: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| start <= n && n <= end)
    }

    /// The number of message numbers covered by the set.
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|&(start, end)| (end - start) as usize + 1)
            .sum()
    }
}

struct Range(u32, u32);

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == self.1 {
            write!(f, "{}", self.0)
        } else {
            write!(f, "{}:{}", self.0, self.1)
        }
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&iter_join(
            self.ranges.iter().map(|&(start, end)| Range(start, end)),
            ",",
        ))
    }
}
