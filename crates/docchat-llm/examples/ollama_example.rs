//! Example demonstrating the Ollama embedder and generator
//!
//! This example embeds a question, then streams an answer fragment by fragment.
//!
//! Note: This example requires Ollama to be running locally with the models installed.
//! To run: cargo run --example ollama_example

use docchat_core::models::PromptText;
use docchat_llm::{Embedder, Generator, OllamaEmbedder, OllamaGenerator};
use futures::StreamExt;
use std::io::Write;

#[tokio::main]
async fn main() {
    println!("Docchat LLM - Ollama Example");
    println!("============================\n");

    let embedder = OllamaEmbedder::localhost("nomic-embed-text", 768);

    println!("Embedder Configuration:");
    println!("  Model: {}", embedder.model_name());
    println!("  Dimensions: {}", embedder.dimensions());
    println!();

    match embedder.embed("What is the refund policy?").await {
        Ok(vector) => {
            println!("✓ Generated a {}-dimensional embedding", vector.len());
            println!("    First 5 values: {:?}\n", &vector[..5.min(vector.len())]);
        }
        Err(e) => {
            println!("✗ Failed to generate embedding:");
            println!("  {}", e);
            println!("\nTo run this example successfully:");
            println!("  1. Install Ollama: https://ollama.ai");
            println!("  2. Start Ollama: ollama serve");
            println!("  3. Pull the models: ollama pull nomic-embed-text && ollama pull llama3.2");
            return;
        }
    }

    let generator = match OllamaGenerator::new("http://localhost:11434", "llama3.2") {
        Ok(generator) => generator,
        Err(e) => {
            println!("✗ {}", e);
            return;
        }
    };

    let prompt = PromptText::new("In one sentence, what is retrieval-augmented generation?");
    println!("Streaming answer from {}:", generator.model_name());

    match generator.generate_stream(&prompt).await {
        Ok(mut fragments) => {
            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        print!("{}", text);
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => {
                        println!("\n✗ Stream failed: {}", e);
                        return;
                    }
                }
            }
            println!("\n✓ Done");
        }
        Err(e) => println!("✗ Failed to start generation: {}", e),
    }
}
