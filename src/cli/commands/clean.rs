//! Clean command implementation.

use super::{chat_model, load_prompts};
use crate::cleanup::TranscriptCleaner;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::CueragError;
use crate::transcript::{join_utterances, SpeakerExtractor};
use anyhow::Result;
use std::path::Path;

/// Run the clean command.
pub async fn run_clean(
    input: &str,
    first_name: Option<String>,
    last_name: Option<String>,
    speaker: Option<String>,
    model: Option<String>,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    let path = Settings::expand_path(input);

    let (text, default_speaker) = match (first_name.as_deref(), last_name.as_deref()) {
        (Some(first), Some(last)) => {
            let text = speaker_text(&path, first, last)?;
            (text, format!("{} {}", first, last))
        }
        _ => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| CueragError::file_access(&path, e))?;
            (text, "the speaker".to_string())
        }
    };

    if text.trim().is_empty() {
        Output::warning("Nothing to clean.");
        return Ok(());
    }

    if let Err(e) = preflight::check(&settings, Operation::Clean, model.as_deref()).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let cleaner = TranscriptCleaner::new(chat_model(&settings, model.as_deref())?)
        .with_prompts(load_prompts(&settings)?);
    let speaker = speaker.unwrap_or(default_speaker);

    let spinner = Output::spinner("Cleaning transcript...");
    let result = cleaner.clean(&text, &speaker).await;
    spinner.finish_and_clear();

    let cleaned = match result {
        Ok(cleaned) => cleaned,
        Err(e) => {
            Output::error(&format!("Cleanup failed: {}", e));
            return Err(e.into());
        }
    };

    match output {
        Some(out) => {
            let out_path = Settings::expand_path(&out);
            std::fs::write(&out_path, format!("{}\n", cleaned))?;
            Output::success(&format!("Wrote cleaned text to {}", out_path.display()));
        }
        None => println!("{}", cleaned),
    }

    Ok(())
}

fn speaker_text(path: &Path, first: &str, last: &str) -> Result<String> {
    let extractor = SpeakerExtractor::new(first, last)?;
    let utterances = extractor.extract(path)?;
    if utterances.is_empty() {
        Output::warning(&format!("No utterances found for {}", extractor.tag()));
    }
    Ok(join_utterances(&utterances))
}
