//! Greedy selection of a top-ranked subset with near-duplicates removed.

use anyhow::{anyhow, Result};
use std::cmp::Ordering;
use tracing::debug;

use super::similarity::cosine_similarity;
use super::TARGET_VECTOR;

/// Anything that can be ranked and compared by embedding.
#[derive(Clone, Debug)]
pub struct Candidate<T> {
    pub item: T,
    pub embedding: Vec<f32>,
    pub rank: f64,
}

/// A candidate that made it into the selection, with its similarity to every other
/// selected item (by position in the selection, self excluded).
#[derive(Clone, Debug)]
pub struct Selected<T> {
    pub item: T,
    pub embedding: Vec<f32>,
    pub similarities: Vec<(usize, f32)>,
}

/// Picks at most `limit` candidates, highest rank first, skipping any candidate whose
/// similarity to an already selected one reaches `threshold`.
///
/// Ties in rank keep input order. The first candidate is always admitted. Selected
/// items come back in admission order, annotated with their pairwise similarities.
pub fn select_unique<T>(
    candidates: Vec<Candidate<T>>,
    threshold: f32,
    limit: usize,
) -> Result<Vec<Selected<T>>> {
    check_dimensions(candidates.iter().map(|c| c.embedding.as_slice()))?;

    let mut sorted = candidates;
    // sort_by is stable, which keeps equal ranks in input order
    sorted.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));

    let mut admitted: Vec<Candidate<T>> = Vec::new();
    for candidate in sorted {
        if admitted.len() >= limit {
            break;
        }
        let max_similarity = admitted
            .iter()
            .map(|kept| cosine_similarity(&candidate.embedding, &kept.embedding))
            .fold(f32::NEG_INFINITY, f32::max);

        if admitted.is_empty() || max_similarity < threshold {
            admitted.push(candidate);
        } else {
            debug!(target: TARGET_VECTOR, "Rejected candidate with rank {} (max similarity {:.3})", candidate.rank, max_similarity);
        }
    }

    let embeddings: Vec<Vec<f32>> = admitted.iter().map(|c| c.embedding.clone()).collect();
    Ok(admitted
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| Selected {
            similarities: embeddings
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, other)| (j, cosine_similarity(&candidate.embedding, other)))
                .collect(),
            item: candidate.item,
            embedding: candidate.embedding,
        })
        .collect())
}

/// All index pairs `(i, j)` with `i < j` whose similarity is at least `threshold`.
pub fn similar_pairs(embeddings: &[Vec<f32>], threshold: f32) -> Result<Vec<(usize, usize, f32)>> {
    check_dimensions(embeddings.iter().map(Vec::as_slice))?;

    let mut pairs = Vec::new();
    for i in 0..embeddings.len() {
        for j in (i + 1)..embeddings.len() {
            let similarity = cosine_similarity(&embeddings[i], &embeddings[j]);
            if similarity >= threshold {
                pairs.push((i, j, similarity));
            }
        }
    }
    Ok(pairs)
}

fn check_dimensions<'a>(mut vectors: impl Iterator<Item = &'a [f32]>) -> Result<()> {
    let Some(first) = vectors.next() else {
        return Ok(());
    };
    let expected = first.len();
    for (offset, vector) in vectors.enumerate() {
        if vector.len() != expected {
            return Err(anyhow!(
                "Vector dimensions don't match: {} vs {} (candidate {})",
                expected,
                vector.len(),
                offset + 1
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &'static str, embedding: Vec<f32>, rank: f64) -> Candidate<&'static str> {
        Candidate {
            item: name,
            embedding,
            rank,
        }
    }

    /// Unit vector at `degrees` in the plane.
    fn angle(degrees: f32) -> Vec<f32> {
        let radians = degrees.to_radians();
        vec![radians.cos(), radians.sin()]
    }

    fn names(selected: &[Selected<&'static str>]) -> Vec<&'static str> {
        selected.iter().map(|s| s.item).collect()
    }

    #[test]
    fn test_empty_input() {
        let selected = select_unique(Vec::<Candidate<&str>>::new(), 0.85, 10).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_threshold_decides_pair() {
        // cos(acos(0.9)) = 0.9 between the two articles
        let offset = 0.9f32.acos().to_degrees();
        let make = || {
            vec![
                candidate("low", angle(offset), 3.0),
                candidate("high", angle(0.0), 10.0),
            ]
        };

        let strict = select_unique(make(), 0.85, 10).unwrap();
        assert_eq!(names(&strict), vec!["high"]);

        let loose = select_unique(make(), 0.95, 10).unwrap();
        assert_eq!(names(&loose), vec!["high", "low"]);
        assert!((loose[0].similarities[0].1 - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_identical_vectors_keep_one() {
        let candidates = (0..5)
            .map(|i| candidate("same", vec![0.3, 0.4, 0.5], i as f64))
            .collect();
        let selected = select_unique(candidates, 0.85, 3).unwrap();
        assert_eq!(selected.len(), 1);
        assert!(selected[0].similarities.is_empty());
    }

    #[test]
    fn test_never_admits_similar_pair() {
        let candidates: Vec<_> = [0.0, 5.0, 20.0, 24.0, 50.0, 51.0, 80.0, 89.0]
            .iter()
            .enumerate()
            .map(|(i, deg)| candidate("c", angle(*deg), (i * 7 % 5) as f64))
            .collect();
        let threshold = 0.97;
        let selected = select_unique(candidates, threshold, 10).unwrap();
        for (i, a) in selected.iter().enumerate() {
            for b in selected.iter().skip(i + 1) {
                assert!(cosine_similarity(&a.embedding, &b.embedding) < threshold);
            }
        }
        assert!(selected.len() <= 8);
    }

    #[test]
    fn test_threshold_one_keeps_first_k_by_rank() {
        let candidates = vec![
            candidate("c", angle(40.0), 1.0),
            candidate("a", angle(0.0), 5.0),
            candidate("tie-first", angle(10.0), 3.0),
            candidate("tie-second", angle(20.0), 3.0),
            candidate("d", angle(60.0), 0.0),
        ];
        let selected = select_unique(candidates, 1.0, 3).unwrap();
        assert_eq!(names(&selected), vec!["a", "tie-first", "tie-second"]);
    }

    #[test]
    fn test_fewer_survivors_than_limit() {
        let candidates = vec![
            candidate("a", angle(0.0), 2.0),
            candidate("a-dup", angle(1.0), 1.0),
        ];
        let selected = select_unique(candidates, 0.85, 10).unwrap();
        assert_eq!(names(&selected), vec!["a"]);
    }

    #[test]
    fn test_zero_vectors_are_dissimilar() {
        let candidates = vec![
            candidate("zero-1", vec![0.0, 0.0], 2.0),
            candidate("zero-2", vec![0.0, 0.0], 1.0),
            candidate("real", vec![1.0, 0.0], 0.5),
        ];
        let selected = select_unique(candidates, 0.85, 10).unwrap();
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].similarities, vec![(1, 0.0), (2, 0.0)]);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let candidates = vec![
            candidate("a", vec![1.0, 0.0], 1.0),
            candidate("b", vec![1.0, 0.0, 0.0], 0.0),
        ];
        assert!(select_unique(candidates, 0.85, 10).is_err());
    }

    #[test]
    fn test_similar_pairs() {
        let embeddings = vec![angle(0.0), angle(90.0), angle(2.0)];
        let pairs = similar_pairs(&embeddings, 0.85).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 2));
    }
}
