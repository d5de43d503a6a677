/// Below this magnitude a vector is treated as zero.
const MIN_MAGNITUDE: f32 = 1e-6;

/// Cosine similarity between two vectors of equal dimension.
///
/// Zero-magnitude vectors have no direction, so they are reported as dissimilar (0.0)
/// instead of dividing by zero. Mismatched lengths compare only the shared prefix;
/// callers that care validate dimensions up front.
pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> f32 {
    let mag1: f32 = vec1.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag1 < MIN_MAGNITUDE || mag2 < MIN_MAGNITUDE {
        return 0.0;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    dot_product / (mag1 * mag2)
}

/// Rounds a score to three decimals for reports and JSON output.
pub fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}
