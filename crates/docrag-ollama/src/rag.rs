//! Retrieval-augmented answering over the vector index.

use docrag_core::{Answer, AnswerGenerator, ScoredChunk, SourceExcerpt, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer returned when the search finds nothing to ground an answer on.
pub const NO_DOCUMENTS_ANSWER: &str = "I could not find any relevant documents to answer your question. Please make sure documents have been uploaded and indexed.";

/// Answer returned for an empty question.
pub const EMPTY_QUESTION_ANSWER: &str = "Please provide a question to search the documents.";

/// Instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = r#"You are an assistant that answers questions using only the document excerpts provided in the context.

Rules:
- Answer only from the provided context. Do not use outside knowledge.
- If the answer is not in the context, say: "I could not find an answer in the available documents."
- Be concise and precise.
- When possible, cite the source document the information comes from."#;

const GENERATION_FAILED: &str = "An error occurred while generating the answer. Please check that Ollama is running and the model is available.";

const SEARCH_FAILED: &str = "An error occurred while searching the documents.";

/// Configuration for RAG queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagConfig {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Character budget of each returned source excerpt.
    pub excerpt_chars: usize,
    /// Character budget of the chunk previews written to the debug log.
    pub log_preview_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            excerpt_chars: 300,
            log_preview_chars: 120,
        }
    }
}

impl RagConfig {
    pub fn from_config(config: &docrag_config::RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            excerpt_chars: config.excerpt_chars,
            log_preview_chars: config.log_preview_chars,
        }
    }
}

/// Answers questions from the chunks stored in a [`VectorIndex`].
///
/// Never fails outwardly: empty retrieval, search errors and generation errors
/// all come back as readable answer text.
pub struct RetrievalAssembler {
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
    config: RagConfig,
}

impl RetrievalAssembler {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
        config: RagConfig,
    ) -> Self {
        Self {
            index,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer `question`, searching only chunks of `topic_filter` when given.
    ///
    /// A blank filter means no filter; any other filter is used and echoed as given.
    pub fn answer(&self, question: &str, topic_filter: Option<&str>) -> Answer {
        let applied_filter = topic_filter
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);

        if question.trim().is_empty() {
            return Answer {
                answer: EMPTY_QUESTION_ANSWER.to_string(),
                sources: Vec::new(),
                applied_filter,
            };
        }

        info!(
            "Answering question (topic filter: {})",
            applied_filter.as_deref().unwrap_or("none")
        );

        let results = match self
            .index
            .search(question, self.config.top_k, applied_filter.as_deref())
        {
            Ok(results) => results,
            Err(e) => {
                warn!("Similarity search failed: {}", e);
                return Answer {
                    answer: format!("{} Error: {}", SEARCH_FAILED, e),
                    sources: Vec::new(),
                    applied_filter,
                };
            }
        };

        if results.is_empty() {
            info!("No relevant chunks found");
            return Answer {
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: Vec::new(),
                applied_filter,
            };
        }

        for (i, result) in results.iter().enumerate() {
            debug!(
                "Source {} [{}] topic={} score={:.3}: {}",
                i + 1,
                result.chunk.metadata.source_file,
                result.chunk.metadata.topic,
                result.score,
                truncate_content(&result.chunk.content, self.config.log_preview_chars)
            );
        }

        let user_message = build_user_message(&build_context(&results), question);
        let answer = match self.generator.generate(SYSTEM_PROMPT, &user_message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                format!("{} Error: {}", GENERATION_FAILED, e)
            }
        };

        let sources = results
            .iter()
            .map(|r| SourceExcerpt {
                source_file: r.chunk.metadata.source_file.clone(),
                excerpt: truncate_content(&r.chunk.content, self.config.excerpt_chars),
            })
            .collect();

        Answer {
            answer,
            sources,
            applied_filter,
        }
    }
}

/// Concatenate retrieved chunks in the order given, each under a numbered
/// source label.
pub fn build_context(results: &[ScoredChunk]) -> String {
    let mut context = String::new();
    for (i, result) in results.iter().enumerate() {
        context.push_str(&format!(
            "[Source {} — {}]\n{}\n\n",
            i + 1,
            result.chunk.metadata.source_file,
            result.chunk.content
        ));
    }
    context.trim_end().to_string()
}

/// User message carrying the context block and the question.
pub fn build_user_message(context: &str, question: &str) -> String {
    format!(
        "CONTEXT FROM DOCUMENTS:\n---\n{}\n---\n\nQUESTION: {}",
        context, question
    )
}

/// Truncate content to at most `max_chars` characters, ending in an ellipsis
/// when shortened and there is room for one.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";

    if content.chars().count() <= max_chars {
        content.to_string()
    } else if max_chars < ELLIPSIS.len() {
        content.chars().take(max_chars).collect()
    } else {
        let truncated: String = content.chars().take(max_chars - ELLIPSIS.len()).collect();
        format!("{}{}", truncated, ELLIPSIS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::{Chunk, ChunkMetadata};
    use std::sync::Mutex;

    struct FakeIndex {
        results: Vec<ScoredChunk>,
        fail: bool,
        calls: Mutex<Vec<(String, usize, Option<String>)>>,
    }

    impl FakeIndex {
        fn with(results: Vec<ScoredChunk>) -> Self {
            Self {
                results,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl VectorIndex for FakeIndex {
        fn add(&self, _chunks: Vec<Chunk>) -> docrag_core::Result<()> {
            Ok(())
        }

        fn search(
            &self,
            query: &str,
            top_k: usize,
            topic: Option<&str>,
        ) -> docrag_core::Result<Vec<ScoredChunk>> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), top_k, topic.map(str::to_string)));
            if self.fail {
                return Err(docrag_core::Error::Index("database is locked".to_string()));
            }
            Ok(self
                .results
                .iter()
                .filter(|r| topic.map_or(true, |t| r.chunk.metadata.topic == t))
                .take(top_k)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        requests: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl AnswerGenerator for RecordingGenerator {
        fn generate(&self, system_prompt: &str, user_message: &str) -> docrag_core::Result<String> {
            self.requests
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_message.to_string()));
            if self.fail {
                return Err(docrag_core::Error::Generation(
                    "connection refused".to_string(),
                ));
            }
            Ok("The standard rate is 21% [iva-guide.pdf].".to_string())
        }
    }

    fn scored(topic: &str, file: &str, content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(
                0,
                content,
                ChunkMetadata::new(topic, file, format!("/docs/{}/{}", topic, file)),
            ),
            score,
        }
    }

    fn corpus() -> Vec<ScoredChunk> {
        vec![
            scored(
                "tax-law",
                "iva-guide.pdf",
                &"IVA standard rate is 21 percent. ".repeat(20),
                0.9,
            ),
            scored("tax-law", "irpf.pdf", "IRPF brackets for residents.", 0.6),
            scored("recipes", "paella.txt", "Paella uses bomba rice.", 0.2),
        ]
    }

    fn assembler(
        index: FakeIndex,
        generator: RecordingGenerator,
    ) -> (RetrievalAssembler, Arc<FakeIndex>, Arc<RecordingGenerator>) {
        let index = Arc::new(index);
        let generator = Arc::new(generator);
        let assembler =
            RetrievalAssembler::new(index.clone(), generator.clone(), RagConfig::default());
        (assembler, index, generator)
    }

    #[test]
    fn test_answer_with_context() {
        let (assembler, index, generator) =
            assembler(FakeIndex::with(corpus()), RecordingGenerator::default());

        let answer = assembler.answer("What is IVA?", Some("tax-law"));

        assert_eq!(answer.answer, "The standard rate is 21% [iva-guide.pdf].");
        assert_eq!(answer.applied_filter.as_deref(), Some("tax-law"));
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].source_file, "iva-guide.pdf");
        assert_eq!(answer.sources[0].excerpt.chars().count(), 300);
        assert!(answer.sources[0].excerpt.ends_with("..."));
        assert_eq!(answer.sources[1].excerpt, "IRPF brackets for residents.");

        let calls = index.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ("What is IVA?".to_string(), 5, Some("tax-law".to_string()))
        );

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (system, user) = &requests[0];
        assert_eq!(system, SYSTEM_PROMPT);
        assert!(user.starts_with(
            "CONTEXT FROM DOCUMENTS:\n---\n[Source 1 — iva-guide.pdf]\n"
        ));
        assert!(user.contains("[Source 2 — irpf.pdf]\nIRPF brackets for residents."));
        assert!(user.ends_with("---\n\nQUESTION: What is IVA?"));
        // The generator sees the full chunk text, not the excerpt
        let full_text = "IVA standard rate is 21 percent. ".repeat(20);
        assert!(user.contains(full_text.trim_end()));
    }

    #[test]
    fn test_empty_retrieval_skips_generation() {
        let (assembler, _index, generator) =
            assembler(FakeIndex::with(Vec::new()), RecordingGenerator::default());

        let answer = assembler.answer("What is IVA?", Some("tax-law"));

        assert_eq!(answer.answer, NO_DOCUMENTS_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.applied_filter.as_deref(), Some("tax-law"));
        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generation_failure_becomes_answer_text() {
        let generator = RecordingGenerator {
            fail: true,
            ..RecordingGenerator::default()
        };
        let (assembler, _index, _generator) = assembler(FakeIndex::with(corpus()), generator);

        let answer = assembler.answer("What is IVA?", None);

        assert!(answer.answer.starts_with(GENERATION_FAILED));
        assert!(answer.answer.contains("connection refused"));
        assert_eq!(answer.sources.len(), 3);
        assert_eq!(answer.applied_filter, None);
    }

    #[test]
    fn test_search_failure_becomes_answer_text() {
        let index = FakeIndex {
            fail: true,
            ..FakeIndex::with(corpus())
        };
        let (assembler, _index, generator) = assembler(index, RecordingGenerator::default());

        let answer = assembler.answer("What is IVA?", None);

        assert!(answer.answer.starts_with(SEARCH_FAILED));
        assert!(answer.sources.is_empty());
        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_blank_question_and_filter() {
        let (assembler, index, _generator) =
            assembler(FakeIndex::with(corpus()), RecordingGenerator::default());

        let answer = assembler.answer("   ", Some("tax-law"));
        assert_eq!(answer.answer, EMPTY_QUESTION_ANSWER);
        assert!(index.calls.lock().unwrap().is_empty());

        let answer = assembler.answer("paella?", Some("  "));
        assert_eq!(answer.applied_filter, None);

        let answer = assembler.answer("paella?", Some("recipes "));
        assert_eq!(answer.applied_filter.as_deref(), Some("recipes "));
        let calls = index.calls.lock().unwrap();
        assert_eq!(calls[0].2, None);
        assert_eq!(calls.last().unwrap().2.as_deref(), Some("recipes "));
    }

    #[test]
    fn test_build_context_order() {
        let context = build_context(&corpus()[1..]);
        assert_eq!(
            context,
            "[Source 1 — irpf.pdf]\nIRPF brackets for residents.\n\n\
             [Source 2 — paella.txt]\nPaella uses bomba rice."
        );
    }

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("Hello", 10), "Hello");

        let truncated = truncate_content("This is a very long string that should be truncated", 20);
        assert_eq!(truncated.chars().count(), 20);
        assert!(truncated.ends_with("..."));

        // Multi-byte characters are never split
        let truncated = truncate_content("ñññññññññññññ", 6);
        assert_eq!(truncated, "ñññ...");

        // Budgets too small for an ellipsis still hold
        assert_eq!(truncate_content("Hello", 2), "He");
        assert_eq!(truncate_content("Hello", 0), "");
        assert_eq!(truncate_content("Hello", 3), "...");
    }
}
