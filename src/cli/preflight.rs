//! Pre-flight checks before running the pipeline.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidqaError};
use crate::openai::is_local_api_base;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript requires yt-dlp.
    Transcript,
    /// Retrieval and answering also need model API access.
    Answer,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_tool(&settings.transcript.ytdlp_path)?;
    if let Operation::Answer = operation {
        check_api_key(&settings.provider.api_base, &settings.provider.api_key_env)?;
    }
    Ok(())
}

/// Hosted APIs need a key; local servers such as Ollama do not.
fn check_api_key(api_base: &str, env_var: &str) -> Result<()> {
    if is_local_api_base(api_base) {
        return Ok(());
    }

    match std::env::var(env_var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(VidqaError::Config(format!(
            "{} is empty but {} requires an API key. Set it with: export {}='...'",
            env_var, api_base, env_var
        ))),
        Err(_) => Err(VidqaError::Config(format!(
            "{} not set but {} requires an API key. Set it with: export {}='...'",
            env_var, api_base, env_var
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidqaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidqaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidqaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
