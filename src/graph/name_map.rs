use bstr::{BStr, BString, ByteSlice};

use fnv::FnvHashMap;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Bidirectional mapping between contig names and the dense vertex
/// indices used inside the overlap graph. Indices are handed out in
/// insertion order, so iterating over `0..len()` visits names in the
/// order they were first seen.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct NameMap {
    pub(crate) name_map: FnvHashMap<BString, usize>,
    pub(crate) inverse_map: Vec<BString>,
}

impl NameMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.inverse_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse_map.is_empty()
    }

    pub fn map_name<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        self.name_map.get(name.as_ref().as_bstr()).copied()
    }

    pub fn inverse_map_name(&self, id: usize) -> Option<&'_ BStr> {
        self.inverse_map.get(id).map(|bs| bs.as_bstr())
    }

    /// Return the index of `name`, assigning the next free index if
    /// the name hasn't been seen before.
    pub fn get_or_insert<N: AsRef<[u8]>>(&mut self, name: N) -> usize {
        let name = name.as_ref();
        if let Some(ix) = self.name_map.get(name.as_bstr()) {
            *ix
        } else {
            let ix = self.inverse_map.len();
            let name = BString::from(name);
            self.name_map.insert(name.clone(), ix);
            self.inverse_map.push(name);
            ix
        }
    }

    /// Iterate over `(index, name)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'_ BStr)> + '_ {
        self.inverse_map
            .iter()
            .enumerate()
            .map(|(ix, name)| (ix, name.as_bstr()))
    }
}
