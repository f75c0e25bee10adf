//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(video: &str, query: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching transcript...");
    let results = orchestrator.retrieve(video, query).await;
    spinner.finish_and_clear();

    match results {
        Ok(retrieval) => {
            if retrieval.chunks.is_empty() {
                Output::warning("The transcript produced no chunks.");
            } else {
                Output::success(&format!(
                    "Found {} results in {} ({})",
                    retrieval.chunks.len(),
                    retrieval.video_id,
                    retrieval.selection
                ));

                for (i, chunk) in retrieval.chunks.iter().enumerate() {
                    Output::search_result(i + 1, chunk.chunk_order, chunk.score, &chunk.content);
                }
            }
        }
        Err(failure) => {
            Output::warning_banner(&failure.message);
            return Err(anyhow::anyhow!("{}", failure));
        }
    }

    Ok(())
}
