use fnv::FnvHashMap;
use rayon::prelude::*;
use tracing::debug;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::merge::MergedContig;

/// The rule that decided between several candidates sharing the best
/// path score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Tiebreak {
    /// Only one candidate had the best score
    None,
    /// Best score was 0; the longest merge won
    Longest,
    /// Best score was nonzero; the merge with the fewest errors won
    LowestError,
}

impl std::fmt::Display for Tiebreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tiebreak::None => "none",
            Tiebreak::Longest => "longest",
            Tiebreak::LowestError => "lowest error",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of choosing among all merges that start at one root
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSelection {
    pub root: usize,
    /// Number of merged contigs (paths) starting at this root
    pub candidates: usize,
    /// Number of candidates sharing the best score
    pub ties: usize,
    pub tiebreak: Tiebreak,
    pub winner: MergedContig,
    /// The losing candidates, in path order. Empty unless rejected
    /// merges were asked to be kept.
    pub rejected: Vec<MergedContig>,
}

/// Group merged contigs by the first vertex of their path. Groups come
/// out in order of first appearance, and each group keeps the input
/// order of its members.
pub fn group_by_root(
    merged: Vec<MergedContig>,
) -> Vec<(usize, Vec<MergedContig>)> {
    let mut index: FnvHashMap<usize, usize> = FnvHashMap::default();
    let mut groups: Vec<(usize, Vec<MergedContig>)> = Vec::new();

    for contig in merged {
        let root = contig.root();
        let ix = *index.entry(root).or_insert_with(|| {
            groups.push((root, Vec::new()));
            groups.len() - 1
        });
        groups[ix].1.push(contig);
    }

    groups
}

/// Index of the winning candidate, and the rule that was needed to
/// pick it. `branch` must be non-empty.
fn pick_winner(branch: &[MergedContig]) -> (usize, usize, Tiebreak) {
    let min_score = branch
        .iter()
        .map(|m| m.path_score())
        .fold(f64::INFINITY, f64::min);

    let tied: Vec<usize> = branch
        .iter()
        .enumerate()
        .filter(|(_, m)| m.path_score() == min_score)
        .map(|(ix, _)| ix)
        .collect();

    if tied.len() == 1 {
        return (tied[0], 1, Tiebreak::None);
    }

    // strict comparisons, so the first of equal candidates stays
    let mut best = tied[0];
    let tiebreak = if min_score == 0.0 {
        for &ix in tied[1..].iter() {
            if branch[ix].merged_length() > branch[best].merged_length() {
                best = ix;
            }
        }
        Tiebreak::Longest
    } else {
        for &ix in tied[1..].iter() {
            if branch[ix].total_error() < branch[best].total_error() {
                best = ix;
            }
        }
        Tiebreak::LowestError
    };

    (best, tied.len(), tiebreak)
}

/// Choose the winning merge among all candidates starting at `root`.
///
/// The lowest path score wins. Among equal scores, a score of exactly 0
/// prefers the longest merged contig, any other score the smallest
/// total error; remaining ties go to the earliest candidate.
///
/// Panics if `branch` is empty.
pub fn select_branch(
    root: usize,
    mut branch: Vec<MergedContig>,
    keep_rejected: bool,
) -> BranchSelection {
    assert!(!branch.is_empty(), "Cannot select from an empty branch");

    let candidates = branch.len();
    let (winner_ix, ties, tiebreak) = pick_winner(&branch);
    let winner = branch.remove(winner_ix);

    let rejected = if keep_rejected { branch } else { Vec::new() };

    BranchSelection {
        root,
        candidates,
        ties,
        tiebreak,
        winner,
        rejected,
    }
}

/// Group `merged` by root and select one winner per group, in order of
/// first appearance of each root. Branches are independent, so with
/// `parallel` they are reduced on the rayon thread pool.
pub fn select_branches(
    merged: Vec<MergedContig>,
    parallel: bool,
    keep_rejected: bool,
) -> Vec<BranchSelection> {
    let groups = group_by_root(merged);

    let selections: Vec<BranchSelection> = if parallel {
        groups
            .into_par_iter()
            .map(|(root, branch)| select_branch(root, branch, keep_rejected))
            .collect()
    } else {
        groups
            .into_iter()
            .map(|(root, branch)| select_branch(root, branch, keep_rejected))
            .collect()
    };

    let tied = selections
        .iter()
        .filter(|s| s.tiebreak != Tiebreak::None)
        .count();
    debug!(
        "Selected winners for {} branches, {} needed a tiebreak",
        selections.len(),
        tied
    );

    selections
}
