use bstr::BString;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// The overlap descriptor attached to a single edge direction. The
/// "from" fields describe the contig the edge leaves, the "to" fields
/// the contig it enters.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct OverlapInfo {
    pub overlap_type: BString,
    pub overlap_length: usize,
    pub mismatches: usize,
    pub edits: usize,
    pub from_ctg_length: usize,
    pub overlap_start_on_from: usize,
    pub overlap_end_on_from: usize,
    pub to_ctg_length: usize,
    pub overlap_start_on_to: usize,
    pub overlap_end_on_to: usize,
}

impl OverlapInfo {
    /// Mismatches and edits summed; the error an edge contributes to a
    /// merge that crosses it.
    #[inline]
    pub fn error(&self) -> usize {
        self.mismatches + self.edits
    }

    /// True if the overlap sits at the very start of the "from"
    /// contig, i.e. the edge points the wrong way for merging.
    #[inline]
    pub fn starts_at_from_head(&self) -> bool {
        self.overlap_start_on_from == 0
    }

    /// Produce the descriptor for the reversed edge, exchanging the
    /// roles of the two contigs.
    pub fn swapped(&self) -> Self {
        OverlapInfo {
            overlap_type: self.overlap_type.clone(),
            overlap_length: self.overlap_length,
            mismatches: self.mismatches,
            edits: self.edits,
            from_ctg_length: self.to_ctg_length,
            overlap_start_on_from: self.overlap_start_on_to,
            overlap_end_on_from: self.overlap_end_on_to,
            to_ctg_length: self.from_ctg_length,
            overlap_start_on_to: self.overlap_start_on_from,
            overlap_end_on_to: self.overlap_end_on_from,
        }
    }
}

/// Display writes the comma-separated positional descriptor, in the
/// same field order the overlap graph parser reads.
impl std::fmt::Display for OverlapInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{}",
            self.overlap_type,
            self.overlap_length,
            self.mismatches,
            self.edits,
            self.from_ctg_length,
            self.overlap_start_on_from,
            self.overlap_end_on_from,
            self.to_ctg_length,
            self.overlap_start_on_to,
            self.overlap_end_on_to,
        )
    }
}
