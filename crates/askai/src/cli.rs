//! Command-line options and output rendering.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;

/// Ask one or more LLM providers from the command line.
///
/// Piped stdin is sent along as context, so `git diff | askai -p "Review"`
/// asks for a review of the diff.
#[derive(Parser, Debug, Default)]
#[command(name = "askai", version)]
pub struct Cli {
    /// Prompt to AI.
    #[arg(short = 'p', long = "prompt")]
    pub prompt: Option<String>,

    /// Prompt to AI, if `-p` is not given.
    #[arg(value_name = "PROMPT")]
    pub positional_prompt: Option<String>,

    /// Batch mode: never ask for a prompt or an API key.
    #[arg(short = 'b', long)]
    pub batch: bool,

    /// Comma-separated engines, each `provider` or `provider:model`.
    #[arg(short = 'e', long = "engines")]
    pub engines: Option<String>,

    /// Ask every supported engine.
    #[arg(long)]
    pub all_engines: bool,

    /// Print the engine name before its output.
    #[arg(long)]
    pub print_engine: bool,

    /// Print the prompt before the output.
    #[arg(long)]
    pub print_prompt: bool,

    /// Do not read the prompt from stdin.
    #[arg(long)]
    pub no_stdin: bool,

    /// Config file to use instead of `~/.askai/config/askai.json`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The command-line prompt, `-p` first, trimmed.
    pub fn prompt_text(&self) -> &str {
        self.prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or(self.positional_prompt.as_deref())
            .unwrap_or_default()
            .trim()
    }

    /// Engines to ask: every provider in `supported` with `--all-engines`,
    /// otherwise `-e` or `default_engines`, parsed by [`parse_engine_list`].
    pub fn engines(&self, default_engines: &str, supported: &[String]) -> Vec<String> {
        if self.all_engines {
            return supported.to_vec();
        }
        parse_engine_list(self.engines.as_deref().unwrap_or(default_engines))
    }
}

/// Split a comma-separated engine list: lowercased, trimmed, empty entries
/// dropped, duplicates removed keeping the first occurrence.
pub fn parse_engine_list(list: &str) -> Vec<String> {
    let mut engines: Vec<String> = Vec::new();
    for engine in list.to_lowercase().split(',').map(str::trim) {
        if !engine.is_empty() && !engines.iter().any(|e| e == engine) {
            engines.push(engine.to_string());
        }
    }
    engines
}

/// Render the answers, engines in name order, each completion trimmed on
/// its own line. `header` renders the optional line before each engine.
pub fn render_responses(
    responses: &HashMap<String, Vec<String>>,
    header: Option<&dyn Fn(&str) -> String>,
) -> String {
    let mut engine_keys: Vec<&String> = responses.keys().collect();
    engine_keys.sort();

    let mut out = String::new();
    for engine_key in engine_keys {
        if let Some(header) = header {
            out.push_str(&header(engine_key.as_str()));
            out.push('\n');
        }
        for completion in &responses[engine_key] {
            out.push_str(completion.trim());
            out.push('\n');
        }
    }
    out
}
