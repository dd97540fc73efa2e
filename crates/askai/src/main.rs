//! Ask one or more LLM providers from the command line.
//!
//! # Examples
//!
//! ```sh
//! # Ask the default engine (cohere unless configured otherwise)
//! askai "Explain quantum computing"
//!
//! # Piped context, two engines, engine headers in the output
//! cat notes.md | askai -p "Summarize" -e openai,cohere --print-engine
//! ```

use std::io::{self, IsTerminal};

use askai::cli::render_responses;
use askai::config::{self, AppConfig};
use askai::{Cli, input, keys, logging};
use askai_rs::{Dispatcher, ProviderRegistry};
use clap::Parser;
use tracing::{debug, error, info, trace, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };

    let (mut config, config_error) = match AppConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    logging::init_logging(&config);
    if let Some(e) = config_error {
        warn!("{e}");
        eprintln!("Warning: {e}, using defaults");
    }
    debug!("Program options: {cli:?}");
    debug!("Config: {config:?}");

    let registry = ProviderRegistry::builtin(&config.http_config()).map_err(|e| e.to_string())?;
    let engines = cli.engines(&config.engine, &registry.names());

    let stdin = io::stdin();
    let stdin_is_terminal = stdin.is_terminal();

    // Keys are asked for on the terminal only; piped stdin is context.
    let resolved = keys::resolve_api_keys(
        &config.api_keys,
        &keys::providers_for(&engines),
        !cli.batch && stdin_is_terminal,
        |name| std::env::var(name).ok(),
        &mut stdin.lock(),
        &mut io::stdout(),
    )?;

    if !resolved.entered.is_empty() {
        config.api_keys.extend(resolved.entered);
        if let Err(e) = config.save(&config_path) {
            warn!("{e}");
        }
    }

    let stdin_text = if cli.no_stdin {
        String::new()
    } else {
        input::read_stdin(
            stdin.lock(),
            stdin_is_terminal,
            !cli.prompt_text().is_empty(),
            cli.batch,
            &mut io::stdout(),
        )?
    };

    let message = input::build_message(cli.prompt_text(), stdin_text)?;
    info!(
        "Prompt: {} chars, context: {} chars",
        message.prompt.len(),
        message.context.len()
    );
    trace!("Prompt: {}", message.full_prompt());

    if cli.print_prompt {
        println!("Prompt: {}", message.full_prompt());
    }

    let dispatcher = Dispatcher::new(registry, resolved.keys, config.dispatch_config());
    let responses = dispatcher
        .dispatch(&engines, &message)
        .await
        .map_err(|e| format!("failed to ask AI: {e}"))?;

    for (engine_key, completions) in &responses {
        info!("Engine: {engine_key}, {} response(s)", completions.len());
        trace!("Responses: {completions:?}");
    }

    let header = |engine_key: &str| config.engine_header(engine_key);
    let header: Option<&dyn Fn(&str) -> String> = if cli.print_engine {
        Some(&header)
    } else {
        None
    };
    print!("{}", render_responses(&responses, header));

    Ok(())
}
