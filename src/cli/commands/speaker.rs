//! Speaker command implementation.

use super::open_store;
use crate::chunking::{ChunkingConfig, MarkdownSplitter};
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, UtteranceFormat};
use crate::config::Settings;
use crate::embedding::ServerEmbedder;
use crate::ingest::Ingestor;
use crate::transcript::{join_utterances, SpeakerExtractor};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the speaker command.
pub async fn run_speaker(
    input: &str,
    first_name: &str,
    last_name: &str,
    format: UtteranceFormat,
    output: Option<String>,
    ingest: bool,
    settings: Settings,
) -> Result<()> {
    let extractor = SpeakerExtractor::new(first_name, last_name)?;
    let path = Settings::expand_path(input);

    let (utterances, stats) = match extractor.extract_with_stats(&path) {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    if stats.unterminated_tail {
        Output::warning("Caption file ends inside an unclosed voice span; the tail was ignored.");
    }
    if utterances.is_empty() {
        Output::warning(&format!("No utterances found for {}", extractor.tag()));
        return Ok(());
    }

    let rendered = render(&utterances, format)?;
    match output {
        Some(out) => {
            let out_path = Settings::expand_path(&out);
            std::fs::write(&out_path, &rendered)?;
            Output::success(&format!(
                "Wrote {} utterances to {}",
                utterances.len(),
                out_path.display()
            ));
        }
        None => print!("{}", rendered),
    }

    if ingest {
        ingest_utterances(&path, &utterances, &settings).await?;
    }

    Ok(())
}

fn render(utterances: &[String], format: UtteranceFormat) -> Result<String> {
    let text = match format {
        UtteranceFormat::Plain => {
            let mut s = join_utterances(utterances);
            s.push('\n');
            s
        }
        UtteranceFormat::Numbered => utterances
            .iter()
            .enumerate()
            .map(|(i, u)| format!("{}. {}\n", i + 1, u))
            .collect(),
        UtteranceFormat::Json => {
            let mut s = serde_json::to_string_pretty(utterances)?;
            s.push('\n');
            s
        }
    };
    Ok(text)
}

async fn ingest_utterances(source: &Path, utterances: &[String], settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(settings, Operation::Ingest, None).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let splitter = MarkdownSplitter::new(ChunkingConfig::from(&settings.chunking))?;
    let ingestor = Ingestor::new(
        open_store(settings)?,
        Arc::new(ServerEmbedder::from_settings(settings)?),
        Box::new(splitter),
        &settings.vector_store.collection,
    );

    let spinner = Output::spinner("Indexing utterances...");
    let result = ingestor.ingest_text(source, &join_utterances(utterances)).await;
    spinner.finish_and_clear();

    let chunks = result?;
    Output::success(&format!(
        "Indexed {} chunks into '{}'",
        chunks,
        ingestor.collection()
    ));
    Ok(())
}
