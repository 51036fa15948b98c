//! Component signatures
//!
//! A signature is a set of component indices stored as a bitset. Entities carry
//! the signature of the components attached to them; systems declare the
//! signature they require. Matching is a word-wise AND-equals test.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitOr, BitOrAssign};

use smallvec::SmallVec;

use super::component::ComponentRegistry;
use super::{EcsError, EcsResult};

const WORD_BITS: usize = u64::BITS as usize;

/// Growable bitset of component indices
#[derive(Clone, Default)]
pub struct Signature {
    words: SmallVec<[u64; 1]>,
}

impl Signature {
    /// Create an empty signature
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature with a single component index set
    pub fn from_index(index: u32) -> Self {
        let mut signature = Self::new();
        signature.insert(index);
        signature
    }

    /// Build a signature from a comma-separated list of registered component names
    pub fn from_names(names: &str, registry: &ComponentRegistry) -> EcsResult<Self> {
        let mut signature = Self::new();
        for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let info = registry
                .find_type_info(name)
                .ok_or_else(|| EcsError::UnregisteredComponentType(name.to_string()))?;
            signature.insert(info.index());
        }
        Ok(signature)
    }

    fn locate(index: u32) -> (usize, u64) {
        let index = index as usize;
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    /// Set a component index
    pub fn insert(&mut self, index: u32) {
        let (word, bit) = Self::locate(index);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= bit;
    }

    /// Clear a component index
    pub fn remove(&mut self, index: u32) {
        let (word, bit) = Self::locate(index);
        if let Some(slot) = self.words.get_mut(word) {
            *slot &= !bit;
        }
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }

    /// Check if a component index is set
    pub fn contains(&self, index: u32) -> bool {
        let (word, bit) = Self::locate(index);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Check if every index in `required` is also set here
    pub fn contains_all(&self, required: &Signature) -> bool {
        required.words.iter().enumerate().all(|(i, &needed)| {
            let have = self.words.get(i).copied().unwrap_or(0);
            (have & needed) == needed
        })
    }

    /// Check if no index is set
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of indices set
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clear every index
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Union of two signatures
    pub fn union(&self, other: &Signature) -> Signature {
        let mut result = self.clone();
        result |= other;
        result
    }

    /// Iterate the set indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (word_index * WORD_BITS + bit) as u32)
        })
    }

    fn trimmed(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|&w| w != 0)
            .map_or(0, |last| last + 1);
        &self.words[..len]
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOrAssign<&Signature> for Signature {
    fn bitor_assign(&mut self, rhs: &Signature) {
        if self.words.len() < rhs.words.len() {
            self.words.resize(rhs.words.len(), 0);
        }
        for (word, &other) in self.words.iter_mut().zip(rhs.words.iter()) {
            *word |= other;
        }
    }
}

impl BitOr for &Signature {
    type Output = Signature;

    fn bitor(self, rhs: &Signature) -> Signature {
        self.union(rhs)
    }
}

impl BitOr for Signature {
    type Output = Signature;

    fn bitor(mut self, rhs: Signature) -> Signature {
        self |= &rhs;
        self
    }
}

impl FromIterator<u32> for Signature {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut signature = Self::new();
        for index in iter {
            signature.insert(index);
        }
        signature
    }
}
