//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::format_context_for_display;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the ask command. Missing inputs are read from stdin.
pub async fn run_ask(
    question: Option<String>,
    video: Option<String>,
    show_sources: bool,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let video = match video {
        Some(v) => v,
        None => prompt("Video ID")?,
    };
    let question = match question {
        Some(q) => q,
        None => prompt("Question")?,
    };

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and generating answer...");
    let outcome = orchestrator.answer_question(&video, &question).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(answer) => {
            println!("\n{}\n", answer.text);

            if show_sources && !answer.sources.is_empty() {
                Output::header("Sources");
                Output::kv("Transcript language", &answer.selection.to_string());
                println!("\n{}\n", format_context_for_display(&answer.sources));
            }
        }
        Err(failure) => {
            Output::warning_banner(&failure.into_message());
        }
    }

    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{} ", style(format!("{}:", label)).green().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
