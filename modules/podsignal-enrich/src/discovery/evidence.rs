use ai_client::truncate_to_char_boundary;

use crate::traits::SearchResponse;

/// Max bytes kept from one result snippet.
const SNIPPET_MAX_BYTES: usize = 600;

/// Append-only text buffer handed to the extraction model.
#[derive(Debug, Clone, Default)]
pub struct EvidenceBuffer {
    blocks: Vec<String>,
}

impl EvidenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known facts, verbatim, so the model can anchor on them.
    pub fn seed(&mut self, known: &[(&str, String)]) {
        if known.is_empty() {
            return;
        }
        let mut block = String::from("Known profile data:");
        for (label, value) in known {
            block.push_str(&format!("\n- {label}: {value}"));
        }
        self.blocks.push(block);
    }

    pub fn push_search(&mut self, query: &str, response: &SearchResponse, max_snippets: usize) {
        let mut block = format!("Search Query: {query}");
        if let Some(error) = &response.error {
            block.push_str(&format!("\nSearch failed: {error}"));
            self.blocks.push(block);
            return;
        }
        if let Some(answer) = &response.answer {
            block.push_str(&format!("\nAnswer: {}", answer.trim()));
        }
        for (i, hit) in response.results.iter().take(max_snippets).enumerate() {
            block.push_str(&format!(
                "\nResult {}: {}\nURL: {}\n{}",
                i + 1,
                hit.title.trim(),
                hit.url.trim(),
                truncate_to_char_boundary(hit.content.trim(), SNIPPET_MAX_BYTES)
            ));
        }
        self.blocks.push(block);
    }

    pub fn push_failure(&mut self, query: &str, reason: &str) {
        self.blocks
            .push(format!("Search Query: {query}\nSearch failed: {reason}"));
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn render(&self) -> String {
        self.blocks.join("\n\n")
    }
}
