//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    tenant: &str,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'kilde doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.answer_engine();

    let spinner = Output::spinner("Searching knowledge base...");

    match engine.ask(tenant, question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.answer);
            Output::scores(answer.similarity_score, answer.model_confidence);

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for (rank, source) in answer.sources.iter().enumerate() {
                    Output::search_hit(rank + 1, source.distance, &source.content);
                }
            }

            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
