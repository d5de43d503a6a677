use anyhow::{anyhow, Result};
use async_openai::types::CreateEmbeddingRequestArgs;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::vector::TARGET_VECTOR;
use crate::LLMClient;

/// Embeds `texts` in batches of `batch_size`, preserving input order.
///
/// Any failed batch fails the whole call: a partial embedding set cannot be compared.
pub async fn embed_texts(
    llm_client: &LLMClient,
    model: &str,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let start_time = Instant::now();
    let mut embeddings = Vec::with_capacity(texts.len());

    for (batch_number, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        debug!(target: TARGET_VECTOR, "Embedding batch {} ({} texts)", batch_number + 1, batch.len());
        let vectors = embed_batch(llm_client, model, batch).await?;
        if vectors.len() != batch.len() {
            return Err(anyhow!(
                "Embedding batch {} returned {} vectors for {} texts",
                batch_number + 1,
                vectors.len(),
                batch.len()
            ));
        }
        embeddings.extend(vectors);
    }

    info!(target: TARGET_VECTOR,
        "Embedded {} texts with {} in {:?} (dimensions: {})",
        texts.len(),
        model,
        start_time.elapsed(),
        embeddings.first().map_or(0, Vec::len)
    );

    Ok(embeddings)
}

async fn embed_batch(llm_client: &LLMClient, model: &str, batch: &[String]) -> Result<Vec<Vec<f32>>> {
    match llm_client {
        LLMClient::OpenAI(client) => {
            let request = CreateEmbeddingRequestArgs::default()
                .model(model)
                .input(batch.to_vec())
                .build()?;
            let mut response = client.embeddings().create(request).await?;
            // the API reports an index per vector; don't rely on response order
            response.data.sort_by_key(|e| e.index);
            Ok(response.data.into_iter().map(|e| e.embedding).collect())
        }
        LLMClient::Ollama(ollama) => {
            let request = GenerateEmbeddingsRequest::new(
                model.to_string(),
                EmbeddingsInput::Multiple(batch.to_vec()),
            );
            let response = ollama.generate_embeddings(request).await?;
            Ok(response.embeddings)
        }
    }
}
