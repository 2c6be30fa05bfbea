//! Request construction for grounded generation

use crate::providers::GroundingDocument;
use crate::types::{MetadataExt, SearchHit};

/// Builds the documents and messages sent to the grounding provider
pub struct PromptBuilder;

impl PromptBuilder {
    /// One display record per hit, numbered from 1 in context order
    pub fn build_documents(hits: &[SearchHit], max_snippet_chars: usize) -> Vec<GroundingDocument> {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| {
                let source = hit.metadata.source();
                let doc_type = hit.metadata.doc_type();

                GroundingDocument {
                    title: format!("Document {} (Source: {})", i + 1, source),
                    snippet: format!(
                        "Source: {}\nType: {}\nContent Snippet: {}",
                        source,
                        doc_type,
                        truncate_chars(&hit.content, max_snippet_chars)
                    ),
                }
            })
            .collect()
    }

    /// Message asking the model to explain that nothing relevant was found
    pub fn no_context_message(query: &str) -> String {
        format!(
            "I could not find relevant documents in my knowledge base to answer your question: '{}'. \
             Please try rephrasing or asking about topics covered in the source material.",
            query
        )
    }
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use serde_json::json;

    fn hit(content: &str, source: Option<&str>) -> SearchHit {
        let mut metadata = Metadata::new();
        if let Some(source) = source {
            metadata.insert("source".to_string(), json!(source));
            metadata.insert("type".to_string(), json!("pdf"));
        }
        SearchHit {
            ordinal: 0,
            content: content.to_string(),
            metadata,
            similarity_score: 1.0,
        }
    }

    #[test]
    fn test_documents_are_numbered_from_one() {
        let docs = PromptBuilder::build_documents(
            &[hit("alpha", Some("a.pdf")), hit("beta", Some("b.pdf"))],
            3000,
        );

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Document 1 (Source: a.pdf)");
        assert_eq!(docs[1].title, "Document 2 (Source: b.pdf)");
        assert_eq!(docs[1].snippet, "Source: b.pdf\nType: pdf\nContent Snippet: beta");
    }

    #[test]
    fn test_missing_metadata_defaults_to_unknown() {
        let docs = PromptBuilder::build_documents(&[hit("text", None)], 3000);
        assert_eq!(docs[0].title, "Document 1 (Source: Unknown)");
        assert!(docs[0].snippet.starts_with("Source: Unknown\nType: Unknown\n"));
    }

    #[test]
    fn test_content_is_truncated() {
        let long = "x".repeat(3500);
        let docs = PromptBuilder::build_documents(&[hit(&long, Some("a.pdf"))], 3000);
        let content = docs[0].snippet.rsplit("Content Snippet: ").next().unwrap();
        assert_eq!(content.len(), 3000);
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_no_context_message_quotes_query() {
        let message = PromptBuilder::no_context_message("what is RAG?");
        assert!(message.contains("'what is RAG?'"));
    }
}
