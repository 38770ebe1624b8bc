use anyhow::Result;
use positron_core::models::Answer;

use crate::app;
use crate::config::Config;

/// `positron ask`: answer a message, grounded in the index unless disabled.
pub async fn run_ask(
    config: &Config,
    message: &str,
    top_k: Option<usize>,
    no_context: bool,
) -> Result<()> {
    let service = app::open_service(config).await?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let use_context = config.retrieval.use_context && !no_context;

    let answer = service.answer(message, use_context, top_k).await?;
    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.response.trim_end());

    if answer.sources.is_empty() {
        return;
    }

    println!();
    println!("--- Sources ({}) ---", answer.sources.len());
    for (i, source) in answer.sources.iter().enumerate() {
        let name = source
            .metadata
            .get("source")
            .and_then(|s| s.as_str())
            .unwrap_or("(unknown)");
        match source.metadata.get("page") {
            Some(page) => println!("[{}] {} (page {}) score {:.4}", i + 1, name, page, source.score),
            None => println!("[{}] {} score {:.4}", i + 1, name, source.score),
        }
        println!("    {}", source.content.replace('\n', " "));
    }
}
