//! Narrator Agent.
//!
//! Turns a computed `MultiMatchAnalysis` into a short coaching summary.
//! The agent only ever sees a deterministic digest of the analysis, and
//! its reply is display text: it is never parsed back into data.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{AiBackend, ChatMessage, ChatRequest};
use super::{Agent, AgentError};
use crate::models::MultiMatchAnalysis;

/// Shown when the AI backend fails or returns nothing usable.
pub const FALLBACK_NARRATIVE: &str =
    "AI summary unavailable right now. The trend, category and correlation figures above are complete.";

/// Shown when there is no data to summarise.
pub const NO_DATA_NARRATIVE: &str =
    "No analysis available yet. Add matches and mistakes to generate insights.";

/// Short textual bullets describing an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDigest {
    pub timeframe: String,
    pub trends: Vec<String>,
    pub categories: Vec<String>,
    pub correlations: Vec<String>,
}

impl AnalysisDigest {
    /// Top 3 overall trends, top 3 category trends and top 2 correlations.
    pub fn from_analysis(analysis: &MultiMatchAnalysis) -> Self {
        let trends = analysis
            .overall_trends
            .iter()
            .take(3)
            .map(|t| {
                format!(
                    "{} ({}, {:+.1} pts win rate, {:.0}% confidence)",
                    t.insight.title,
                    t.trend_direction,
                    t.insight.impact_on_win_rate,
                    t.insight.confidence * 100.0
                )
            })
            .collect();

        let categories = analysis
            .category_trends
            .iter()
            .take(3)
            .map(|c| {
                format!(
                    "{}: {} occurrences, {}, {:+.1} pts win rate",
                    c.category.label(),
                    c.total_occurrences,
                    c.trend,
                    c.impact_on_win_rate
                )
            })
            .collect();

        let correlations = analysis
            .correlations
            .iter()
            .take(2)
            .map(|c| format!("{} (strength {:.2})", c.pattern, c.strength))
            .collect();

        Self {
            timeframe: analysis.timeframe.clone(),
            trends,
            categories,
            correlations,
        }
    }

    /// Render as the user prompt body.
    pub fn render(&self, match_count: usize, mistake_count: usize) -> String {
        let mut out = format!(
            "Timeframe: {}\nMatches analyzed: {}\nMistakes recorded: {}\n",
            self.timeframe, match_count, mistake_count
        );
        for (heading, lines) in [
            ("Overall trends", &self.trends),
            ("Mistake categories", &self.categories),
            ("Correlations", &self.correlations),
        ] {
            out.push_str(&format!("\n{}:\n", heading));
            if lines.is_empty() {
                out.push_str("- none\n");
            }
            for line in lines {
                out.push_str(&format!("- {}\n", line));
            }
        }
        out
    }
}

/// Input for the Narrator agent.
#[derive(Debug, Clone)]
pub struct NarratorInput {
    pub digest: AnalysisDigest,
    pub match_count: usize,
    pub mistake_count: usize,
}

/// Narrative shown next to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub text: String,

    /// False when `text` is a static fallback
    pub generated: bool,
}

impl Narrative {
    fn fallback(text: &str) -> Self {
        Self {
            text: text.to_string(),
            generated: false,
        }
    }
}

/// Narrator agent implementation.
pub struct NarratorAgent {
    backend: Arc<dyn AiBackend>,
}

impl NarratorAgent {
    pub fn new(backend: Arc<dyn AiBackend>) -> Self {
        Self { backend }
    }

    fn build_prompt(&self, input: &NarratorInput) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(NARRATOR_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Summarise this team analysis:\n\n{}",
                input.digest.render(input.match_count, input.mistake_count)
            )),
        ]
    }

    /// Summarise an analysis. Never fails: backend errors and empty
    /// replies fall back to a static message.
    pub async fn summarize(
        &self,
        analysis: &MultiMatchAnalysis,
        match_count: usize,
        mistake_count: usize,
    ) -> Narrative {
        if analysis.is_empty() {
            return Narrative::fallback(NO_DATA_NARRATIVE);
        }

        let input = NarratorInput {
            digest: AnalysisDigest::from_analysis(analysis),
            match_count,
            mistake_count,
        };

        match self.execute(input).await {
            Ok(text) => Narrative {
                text,
                generated: true,
            },
            Err(e) => {
                warn!("Narrative generation via {} failed: {}", self.backend.name(), e);
                Narrative::fallback(FALLBACK_NARRATIVE)
            }
        }
    }
}

const NARRATOR_SYSTEM_PROMPT: &str = r#"You are an esports performance analyst writing for a team's coaching staff.

You will receive a digest of a multi-match analysis: win-rate trends, the most frequent mistake categories and heuristic correlations.

Write 2 to 4 plain sentences that:
1. State the overall direction of the team's results
2. Name the most important mistake category and what to do about it
3. Mention a correlation only if one is listed

Do not invent numbers that are not in the digest. Do not use lists or headings."#;

#[async_trait]
impl Agent for NarratorAgent {
    type Input = NarratorInput;
    type Output = String;

    fn name(&self) -> &'static str {
        "narrator"
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError> {
        info!(
            "Narrating analysis of {} matches via {}",
            input.match_count,
            self.backend.name()
        );

        let request = ChatRequest::new(self.build_prompt(&input))
            .with_temperature(0.3)
            .with_max_tokens(300);

        let response = self.backend.chat(request).await?;
        debug!("Narrative generated by model {}", response.model);

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
