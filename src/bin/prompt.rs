//! Interactive prompt with no personality, agent, or user context.
//!
//! Reads questions from stdin, threads the updated transcript between
//! turns, and logs every interaction under `.logs/`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use yapbox_ai::{AiConfig, AiTasks, JsonFileSink, Message};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("YapBox AI Prompt :: No personality, agent, or user context");
    println!("-----------------------------------------------------------------------------------");

    let config = AiConfig::default().from_env();
    let tasker = AiTasks::new(config)?.with_sink(Arc::new(JsonFileSink::new(".logs")));

    let stdin = io::stdin();
    let mut context: Option<Vec<Message>> = None;

    loop {
        print!("User: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        match tasker.ask(question, None, context.as_deref()).await {
            Ok(result) => {
                println!("AI: {}", result.answer);
                context = Some(result.context);
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }

    Ok(())
}
