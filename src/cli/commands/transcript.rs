//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(video: &str, json: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript...");
    let fetched = orchestrator.fetch_transcript(video).await;
    spinner.finish_and_clear();

    let fetched = match fetched {
        Ok(f) => f,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&fetched)?);
        return Ok(());
    }

    Output::header(&format!("Transcript for {}", fetched.transcript.video_id));
    Output::kv("Language", &fetched.selection.to_string());
    Output::kv("Segments", &fetched.transcript.segment_count.to_string());
    println!("\n{}", fetched.transcript.text);

    Ok(())
}
