use smallvec::{smallvec, SmallVec};

use crate::playfield::FieldId;

/// Bit set over field ids. Boards up to 128 fields stay inline.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FieldSet {
    words: SmallVec<[u64; 2]>,
}

impl FieldSet {
    pub fn with_fields(n_fields: usize) -> Self {
        FieldSet { words: smallvec![0; n_fields.div_ceil(64)] }
    }

    pub fn from_fields(n_fields: usize, fields: &[FieldId]) -> Self {
        let mut set = Self::with_fields(n_fields);
        for &f in fields {
            set.insert(f);
        }
        set
    }

    /// Ids outside the set's range (including `NO_FIELD`) are never members.
    #[inline(always)]
    pub fn contains(&self, pos: FieldId) -> bool {
        let idx = pos as usize;
        self.words
            .get(idx / 64)
            .is_some_and(|w| (w & (1u64 << (idx % 64))) != 0)
    }

    #[inline(always)]
    pub fn insert(&mut self, pos: FieldId) {
        let idx = pos as usize;
        self.words[idx / 64] |= 1u64 << (idx % 64);
    }

    #[inline(always)]
    pub fn remove(&mut self, pos: FieldId) {
        let idx = pos as usize;
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playfield::NO_FIELD;

    #[test]
    fn insert_remove_across_words() {
        let mut set = FieldSet::with_fields(200);
        assert_eq!(set, FieldSet::from_fields(200, &[]));
        for f in [0, 63, 64, 130, 199] {
            set.insert(f);
        }
        assert!(set.contains(64));
        assert!(!set.contains(65));
        set.remove(64);
        assert!(!set.contains(64));
        assert_eq!(set, FieldSet::from_fields(200, &[0, 63, 130, 199]));
    }

    #[test]
    fn out_of_range_is_absent() {
        let set = FieldSet::from_fields(10, &[1, 2]);
        assert!(!set.contains(500));
        assert!(!set.contains(NO_FIELD));
    }
}
