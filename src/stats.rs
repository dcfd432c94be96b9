#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Summary statistics over a set of sequence lengths
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct AssemblyStats {
    pub count: usize,
    pub total_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
    pub median_length: f64,
    pub n50: usize,
}

impl AssemblyStats {
    /// Compute the statistics; an empty input gives all zeros.
    ///
    /// The median of an even number of lengths is the mean of the two
    /// middle values. N50 is the largest length L such that contigs of
    /// length at least L make up half or more of the total.
    pub fn from_lengths<I>(lengths: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut lengths: Vec<usize> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return Default::default();
        }
        lengths.sort_unstable();

        let count = lengths.len();
        let total_length: usize = lengths.iter().sum();

        let median_length = if count % 2 == 1 {
            lengths[count / 2] as f64
        } else {
            (lengths[count / 2 - 1] + lengths[count / 2]) as f64 / 2.0
        };

        let mut covered = 0;
        let mut n50 = 0;
        for &len in lengths.iter().rev() {
            covered += len;
            if covered * 2 >= total_length {
                n50 = len;
                break;
            }
        }

        AssemblyStats {
            count,
            total_length,
            min_length: lengths[0],
            max_length: lengths[count - 1],
            mean_length: total_length as f64 / count as f64,
            median_length,
            n50,
        }
    }
}
