//! Grounded question answering with two-signal confidence scoring.

use super::verdict::parse_verdict;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::Generator;
use crate::index::{cosine_similarity, SearchHit, TenantStore};
use crate::retrieval::{Retriever, DEFAULT_TOP_K};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer returned when the tenant has no knowledge base yet.
pub const NO_DOCUMENTS_ANSWER: &str = "No documents found. Please add something first.";

/// A grounded answer with its two confidence signals.
///
/// The signals measure different failure modes and are never conflated:
/// `similarity_score` catches "nothing relevant was retrieved" while
/// `model_confidence` catches "the model was unsure given good context."
#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    /// The answer text.
    pub answer: String,
    /// Cosine similarity between the question and the top retrieved chunk,
    /// scaled to 0-100. Zero when nothing was retrieved.
    pub similarity_score: f32,
    /// The model's self-reported confidence, 0-100. Zero when the model's
    /// output could not be parsed.
    pub model_confidence: f32,
    /// The retrieved chunks the answer was grounded on, ascending by distance.
    pub sources: Vec<SearchHit>,
}

impl GroundedAnswer {
    /// The "no documents yet" soft result.
    fn no_documents() -> Self {
        Self {
            answer: NO_DOCUMENTS_ANSWER.to_string(),
            similarity_score: 0.0,
            model_confidence: 0.0,
            sources: Vec::new(),
        }
    }
}

/// Engine for answering questions from a tenant's knowledge base.
pub struct AnswerEngine {
    generator: Arc<dyn Generator>,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    prompts: Prompts,
    top_k: usize,
}

impl AnswerEngine {
    /// Create a new answer engine.
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn TenantStore>,
        prompts: Prompts,
    ) -> Self {
        Self {
            generator,
            embedder: embedder.clone(),
            retriever: Retriever::new(embedder, store),
            prompts,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer a question from the tenant's knowledge base.
    ///
    /// Returns the soft "no documents" result when the tenant has no knowledge
    /// base; propagates embedding and generation failures as typed errors.
    #[instrument(skip(self), fields(tenant = %tenant, question = %question))]
    pub async fn ask(&self, tenant: &str, question: &str) -> Result<GroundedAnswer> {
        info!("Answering question for tenant '{}'", tenant);

        let retrieval = self.retriever.retrieve(tenant, question, self.top_k).await?;
        if retrieval.is_empty() {
            return Ok(GroundedAnswer::no_documents());
        }

        let context = retrieval
            .hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("question".to_string(), question.to_string());
        let user_prompt = Prompts::render(&self.prompts.grounding.user, &vars);

        let raw = self
            .generator
            .generate(&self.prompts.grounding.system, &user_prompt)
            .await?;

        let verdict = parse_verdict(&raw);
        if !verdict.structured {
            debug!("Model output was not structured; degrading to raw text");
        }

        // Retrieval relevance is scored independently of the model's
        // self-report, and survives a degraded parse
        let similarity_score = self
            .similarity_score(&retrieval.query_embedding, &retrieval.hits[0])
            .await?;

        Ok(GroundedAnswer {
            answer: verdict.answer,
            similarity_score,
            model_confidence: verdict.confidence,
            sources: retrieval.hits,
        })
    }

    /// Cosine similarity between the question and the top retrieved chunk,
    /// as a 0-100 percentage.
    async fn similarity_score(&self, query_embedding: &[f32], top_hit: &SearchHit) -> Result<f32> {
        let chunk_embedding = self.embedder.embed(&top_hit.content).await?;
        Ok(cosine_similarity(query_embedding, &chunk_embedding) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KildeError;
    use crate::index::{MemoryTenantStore, TenantStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic embedder over a fixed phrase table.
    struct StubEmbedder;

    fn stub_vector(text: &str) -> Vec<f32> {
        match text {
            "What is the capital of France?" => vec![0.9, 0.1, 0.0],
            "Paris is the capital of France" => vec![1.0, 0.0, 0.0],
            "Bread needs flour and water" => vec![0.0, 1.0, 0.0],
            _ => vec![0.1, 0.1, 0.1],
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(stub_vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| stub_vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    /// Generator returning a canned response, recording the prompt it saw.
    struct StubGenerator {
        response: Result<String>,
        seen_user_prompt: Mutex<Option<String>>,
    }

    impl StubGenerator {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                seen_user_prompt: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(KildeError::Generative("service unavailable".to_string())),
                seen_user_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            *self.seen_user_prompt.lock().unwrap() = Some(user.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(KildeError::Generative("service unavailable".to_string())),
            }
        }
    }

    async fn seeded_store() -> Arc<MemoryTenantStore> {
        let store = Arc::new(MemoryTenantStore::new());
        let chunks = vec![
            "Paris is the capital of France".to_string(),
            "Bread needs flour and water".to_string(),
        ];
        let embedder = StubEmbedder;
        let vectors = embedder.embed_batch(&chunks).await.unwrap();
        store.append("alice", &vectors, &chunks).await.unwrap();
        store
    }

    fn engine(store: Arc<MemoryTenantStore>, generator: Arc<StubGenerator>) -> AnswerEngine {
        AnswerEngine::new(generator, Arc::new(StubEmbedder), store, Prompts::default())
    }

    #[tokio::test]
    async fn test_structured_answer_with_both_scores() {
        let generator = Arc::new(StubGenerator::ok(r#"{"answer": "Paris", "confidence": 87}"#));
        let engine = engine(seeded_store().await, generator.clone());

        let answer = engine
            .ask("alice", "What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(answer.answer, "Paris");
        assert_eq!(answer.model_confidence, 87.0);
        // The relevant chunk ranks first and scores well above the loose bound
        assert_eq!(answer.sources[0].content, "Paris is the capital of France");
        assert!(answer.similarity_score > 50.0);

        // The grounding prompt carried the retrieved context
        let prompt = generator.seen_user_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Paris is the capital of France"));
        assert!(prompt.contains("What is the capital of France?"));
    }

    #[tokio::test]
    async fn test_unparseable_output_degrades_but_still_scores() {
        let raw = "I believe the answer is Paris.";
        let generator = Arc::new(StubGenerator::ok(raw));
        let engine = engine(seeded_store().await, generator);

        let answer = engine
            .ask("alice", "What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(answer.answer, raw);
        assert_eq!(answer.model_confidence, 0.0);
        assert!(answer.similarity_score > 50.0);
    }

    #[tokio::test]
    async fn test_no_knowledge_base_short_circuits() {
        let generator = Arc::new(StubGenerator::ok("should never be called"));
        let engine = engine(Arc::new(MemoryTenantStore::new()), generator.clone());

        let answer = engine.ask("ghost", "anything?").await.unwrap();

        assert_eq!(answer.answer, NO_DOCUMENTS_ANSWER);
        assert_eq!(answer.similarity_score, 0.0);
        assert_eq!(answer.model_confidence, 0.0);
        assert!(answer.sources.is_empty());
        // The generative model was never invoked
        assert!(generator.seen_user_prompt.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let engine = engine(seeded_store().await, Arc::new(StubGenerator::failing()));

        let err = engine
            .ask("alice", "What is the capital of France?")
            .await
            .unwrap_err();
        assert!(matches!(err, KildeError::Generative(_)));
    }
}
