use crate::cli::QueryArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{QueryOutput, SourceRow};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{bail, Context, Result};
use docchat_core::config::CliConfigOverrides;
use docchat_core::models::SourceCitation;
use docchat_retrieval::{RagPipeline, ResponseFrame, StreamFramer};
use docchat_store::MemoryIndex;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;

pub async fn execute(
    args: &QueryArgs,
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
    output: &OutputWriter,
) -> Result<()> {
    let settings = load_config(config_path, overrides)?
        .resolve()
        .context("Invalid configuration")?;

    let index = MemoryIndex::load(&settings.index_path)?;
    tracing::debug!(
        index = %settings.index_path.display(),
        stream = args.stream,
        "Index loaded"
    );
    let pipeline = RagPipeline::from_settings(&settings, Arc::new(index))?;

    if args.stream {
        stream_answer(&pipeline, &args.query, output).await
    } else {
        batch_answer(&pipeline, &args.query, output).await
    }
}

async fn batch_answer(pipeline: &RagPipeline, query: &str, output: &OutputWriter) -> Result<()> {
    let spinner = create_spinner(
        "Retrieving passages and generating an answer...",
        output.is_json(),
    );

    let answer = match pipeline.try_answer_query(query).await {
        Ok(answer) => {
            finish_success(&spinner, &format!("Answered from {} passages", answer.sources.len()));
            answer
        }
        Err(e) => {
            finish_error(&spinner, "Query failed");
            return Err(e).context("Failed to answer the question");
        }
    };

    if output.is_json() {
        return output.result(QueryOutput {
            query: query.trim().to_string(),
            answer: answer.answer,
            sources: answer.sources,
        });
    }

    output.section("Answer");
    println!("{}", answer.answer);
    print_sources(&answer.sources, output);
    Ok(())
}

/// JSON mode relays the NDJSON frames unchanged; human mode prints fragments as they arrive
async fn stream_answer(pipeline: &RagPipeline, query: &str, output: &OutputWriter) -> Result<()> {
    let mut frames = pipeline.answer_query_stream(query);

    if output.is_json() {
        while let Some(frame) = frames.next().await {
            output.line(&StreamFramer::encode(&frame)?)?;
            if let ResponseFrame::Error(message) = &frame {
                bail!("Streaming answer failed: {}", message);
            }
            if frame.is_terminal() {
                break;
            }
        }
        return Ok(());
    }

    let spinner = create_spinner("Retrieving passages...", false);
    let mut sources: Vec<SourceCitation> = Vec::new();
    let mut answered = false;

    while let Some(frame) = frames.next().await {
        match frame {
            ResponseFrame::Sources(citations) => {
                finish_success(&spinner, &format!("Retrieved {} passages", citations.len()));
                output.section("Answer");
                sources = citations;
            }
            ResponseFrame::Chunk(text) => output.fragment(&text)?,
            ResponseFrame::Done(_) => {
                println!();
                answered = true;
                break;
            }
            ResponseFrame::Error(message) => {
                if spinner.is_finished() {
                    println!();
                    output.warning("The answer above is incomplete");
                } else {
                    finish_error(&spinner, "Query failed");
                }
                bail!("Streaming answer failed: {}", message);
            }
        }
    }

    if !answered {
        bail!("Answer stream ended without a terminal frame");
    }

    print_sources(&sources, output);
    Ok(())
}

fn print_sources(sources: &[SourceCitation], output: &OutputWriter) {
    output.section("Sources");
    if sources.is_empty() {
        output.info("No passages matched the question");
        return;
    }
    output.table(SourceRow::rows(sources));
}
