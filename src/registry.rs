//! Compact, mergeable set of acknowledged primary keys (§3, §4.B).
//!
//! Encoded as a sorted list of non-overlapping, non-adjacent `[lo, hi]` runs,
//! so size tracks `#runs` rather than `#elements` — an idle reader that has
//! acked everything up to pk 10,000 costs one run, not 10,000 bits.

use cbordata::Cborize;

use std::ops::{BitAnd, BitOr};

use crate::util;
use crate::Result;

const RUN_VER: u32 = 0x00020001;
const REGISTRY_VER: u32 = 0x00020002;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Cborize)]
struct Run {
    lo: u64,
    hi: u64,
}

impl Run {
    const ID: u32 = RUN_VER;
}

/// A compact, mergeable set of non-negative integers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Cborize)]
pub struct Registry {
    runs: Vec<Run>,
}

impl Registry {
    const ID: u32 = REGISTRY_VER;

    /// The empty registry, the initial state of a freshly registered reader.
    pub fn new() -> Registry {
        Registry { runs: vec![] }
    }

    fn singleton(pk: u64) -> Registry {
        Registry {
            runs: vec![Run { lo: pk, hi: pk }],
        }
    }

    /// Build a registry from an arbitrary (possibly unsorted) collection of pks.
    pub fn from_pks<I: IntoIterator<Item = u64>>(pks: I) -> Registry {
        let mut reg = Registry::new();
        for pk in pks {
            reg.add(pk);
        }
        reg
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| (r.hi - r.lo + 1) as usize).sum()
    }

    pub fn contains(&self, pk: u64) -> bool {
        self.runs
            .binary_search_by(|r| {
                if pk < r.lo {
                    std::cmp::Ordering::Greater
                } else if pk > r.hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Insert a single pk. Equivalent to, and implemented as, a union with
    /// the singleton registry `{pk}`.
    pub fn add(&mut self, pk: u64) {
        *self = self.union(&Registry::singleton(pk));
    }

    /// Ascending iterator over every pk held by this registry.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.runs.iter().flat_map(|r| r.lo..=r.hi)
    }

    /// `self ∪ other`. Associative, commutative, idempotent (§8).
    pub fn union(&self, other: &Registry) -> Registry {
        let mut all: Vec<Run> = Vec::with_capacity(self.runs.len() + other.runs.len());
        all.extend_from_slice(&self.runs);
        all.extend_from_slice(&other.runs);
        all.sort_by_key(|r| r.lo);

        let mut runs: Vec<Run> = Vec::with_capacity(all.len());
        for r in all {
            match runs.last_mut() {
                Some(last) if r.lo <= last.hi.saturating_add(1) => {
                    if r.hi > last.hi {
                        last.hi = r.hi;
                    }
                }
                _ => runs.push(r),
            }
        }
        Registry { runs }
    }

    /// `self ∩ other`. Associative, commutative, idempotent (§8).
    pub fn intersection(&self, other: &Registry) -> Registry {
        let mut runs = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.runs.len() && j < other.runs.len() {
            let a = self.runs[i];
            let b = other.runs[j];
            let lo = a.lo.max(b.lo);
            let hi = a.hi.min(b.hi);
            if lo <= hi {
                runs.push(Run { lo, hi });
            }
            if a.hi < b.hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Registry { runs }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        util::into_cbor_bytes(self.clone())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Registry> {
        let (registry, _) = util::from_cbor_bytes(bytes)?;
        Ok(registry)
    }
}

impl BitOr for &Registry {
    type Output = Registry;

    fn bitor(self, rhs: &Registry) -> Registry {
        self.union(rhs)
    }
}

impl BitAnd for &Registry {
    type Output = Registry;

    fn bitand(self, rhs: &Registry) -> Registry {
        self.intersection(rhs)
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Registry {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Registry> {
        let pks: Vec<u64> = u.arbitrary()?;
        let pks: Vec<u64> = pks.into_iter().map(|pk| pk % 4096).collect();
        Ok(Registry::from_pks(pks))
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
