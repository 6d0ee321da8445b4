use super::{SummarizeError, SummaryMode};

const DEFAULT_CHUNK_SYSTEM: &str = "You are a helpful assistant that summarizes text.";

const DEFAULT_CHUNK_INSTRUCTIONS: &str = "\
You are a high-context memory summarizer. You will be given a long section of a real \
conversation. Compress it into a detailed, emotionally aware narrative that preserves the \
user's voice, thoughts, emotional state, struggles, and goals, so that another assistant \
reading it later understands who they are, what they are going through, and what they are \
building.

GUIDELINES:
1. Write mostly in paragraphs; use bullet points only for strategies, goals, or frameworks.
2. Preserve tone, including rants, contradictions, and recurring patterns.
3. Quote the user's own phrasing when it is revealing.
4. Favor emotional flow and mental state over rigid structure.
5. Reflect how and why things were said, not only what was said.
6. Include systems, tools, and next steps, wrapped in narrative.
7. Organize with headers such as Identity, Emotional Landscape, Projects, Goals, \
Contradictions, Core Philosophies, and Next Steps.

Do not compress too tightly, do not reduce ideas to bare bullets, and do not discard \
emotional content. Write it as a memory file another assistant will read before continuing \
the relationship.";

const DEFAULT_MERGE_SYSTEM: &str =
    "You are a helpful assistant that combines multiple summaries into one cohesive summary.";

const DEFAULT_MERGE_INSTRUCTIONS: &str = "Combine these summaries into one comprehensive final \
summary. Maintain the structured format and include all key points:";

/// Instructions sent alongside the text for each [`SummaryMode`].
///
/// Templates are plain values fixed at client construction; nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    /// System message for chunk summaries.
    pub chunk_system: String,
    /// Instructions prepended to each chunk.
    pub chunk_instructions: String,
    /// System message for the merge call.
    pub merge_system: String,
    /// Instructions prepended to the concatenated chunk summaries.
    pub merge_instructions: String,
}

/// System and user messages ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System role content.
    pub system: String,
    /// User role content, including the text being summarized.
    pub user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            chunk_system: DEFAULT_CHUNK_SYSTEM.to_string(),
            chunk_instructions: DEFAULT_CHUNK_INSTRUCTIONS.to_string(),
            merge_system: DEFAULT_MERGE_SYSTEM.to_string(),
            merge_instructions: DEFAULT_MERGE_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Replace the chunk instructions, keeping every other template.
    pub fn with_chunk_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.chunk_instructions = instructions.into();
        self
    }

    /// Assemble the messages for `text`, rejecting empty input before any request is built.
    pub fn render(&self, text: &str, mode: SummaryMode) -> Result<RenderedPrompt, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::InvalidInput);
        }

        let prompt = match mode {
            SummaryMode::Chunk => RenderedPrompt {
                system: self.chunk_system.clone(),
                user: format!(
                    "Please summarize the following text using this format:\n\n{}\n\nText to summarize:\n{text}",
                    self.chunk_instructions.trim_end()
                ),
            },
            SummaryMode::Merge => RenderedPrompt {
                system: self.merge_system.clone(),
                user: format!("{}\n\n{text}", self.merge_instructions.trim_end()),
            },
        };
        Ok(prompt)
    }
}
