//! Brute-force similarity ranking.
//!
//! Scores every candidate against the query with cosine similarity and keeps
//! the top K. There is no index: the cost is one pass over all candidates,
//! which is the contract for per-user document collections.
//!
//! # Ordering
//!
//! 1. Similarity descending.
//! 2. Ties keep input order (`sort_by` is stable).
//! 3. Undefined similarities (zero-norm vector, length mismatch, NaN) score
//!    [`UNDEFINED_SIMILARITY`] and therefore sink to the bottom.

use crate::embedding::cosine_similarity;

/// Score assigned when cosine similarity is undefined.
pub const UNDEFINED_SIMILARITY: f32 = -1.0;

/// A candidate text with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<'a> {
    pub text: &'a str,
    pub similarity: f32,
}

/// Similarity of `candidate` to `query`, with undefined cases mapped to
/// [`UNDEFINED_SIMILARITY`].
pub fn similarity(query: &[f32], candidate: &[f32]) -> f32 {
    match cosine_similarity(query, candidate) {
        Some(sim) if !sim.is_nan() => sim,
        _ => UNDEFINED_SIMILARITY,
    }
}

/// Rank candidates and keep the `k` best, with their scores.
pub fn rank_scored<'a, T, V>(query: &[f32], candidates: &'a [(T, V)], k: usize) -> Vec<Scored<'a>>
where
    T: AsRef<str>,
    V: AsRef<[f32]>,
{
    let mut scored: Vec<Scored<'a>> = candidates
        .iter()
        .map(|(text, vector)| Scored {
            text: text.as_ref(),
            similarity: similarity(query, vector.as_ref()),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

/// Rank candidates and return only the texts of the `k` best.
///
/// # Example
///
/// ```rust
/// use docze_core::rank::rank;
///
/// let candidates = vec![
///     ("rust", vec![1.0f32, 0.0]),
///     ("python", vec![0.0, 1.0]),
/// ];
/// assert_eq!(rank(&[0.9, 0.1], &candidates, 1), vec!["rust".to_string()]);
/// ```
pub fn rank<T, V>(query: &[f32], candidates: &[(T, V)], k: usize) -> Vec<String>
where
    T: AsRef<str>,
    V: AsRef<[f32]>,
{
    rank_scored(query, candidates, k)
        .into_iter()
        .map(|s| s.text.to_string())
        .collect()
}
