use std::{error, fmt};

use bstr::{BStr, ByteSlice};

pub type MergeResult<T> = Result<T, MergeError>;

/// Fatal conditions that abort a merge run. No partial output is
/// produced once one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The oriented overlap graph is not acyclic. Includes the name of
    /// a vertex that lies on, or is only reachable through, a cycle.
    Cycle { vertex: String },
    /// A contig referenced by the graph has no sequence in the store.
    MissingSequence { contig: String },
}

impl MergeError {
    #[inline]
    pub(crate) fn cycle(vertex: &BStr) -> Self {
        Self::Cycle {
            vertex: vertex.to_str_lossy().into_owned(),
        }
    }

    #[inline]
    pub(crate) fn missing_sequence(contig: &BStr) -> Self {
        Self::MissingSequence {
            contig: contig.to_str_lossy().into_owned(),
        }
    }
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MergeError as ME;
        match self {
            ME::Cycle { vertex } => write!(
                f,
                "Overlap graph contains a cycle through contig `{}`",
                vertex
            ),
            ME::MissingSequence { contig } => write!(
                f,
                "Contig `{}` is in the overlap graph but has no sequence",
                contig
            ),
        }
    }
}

impl error::Error for MergeError {}
