//! API-key completion for the requested providers.
//!
//! Keys come from, in order: the config file, the `<PROVIDER>_API_KEY`
//! environment variable, and an interactive prompt. Only keys typed at the
//! prompt are worth persisting, so they are returned separately.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use askai_rs::EngineId;
use tracing::{debug, info};

/// Keys for a dispatch, plus the subset the user typed in.
#[derive(Default)]
pub struct ResolvedKeys {
    pub keys: HashMap<String, String>,
    pub entered: HashMap<String, String>,
}

/// `OPENAI_API_KEY` for `openai`.
pub fn env_var_name(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

/// Distinct provider names of `engines`, in first-seen order. Engines that
/// do not parse are skipped; dispatch reports them.
pub fn providers_for(engines: &[String]) -> Vec<String> {
    let mut providers: Vec<String> = Vec::new();
    for id in engines.iter().filter_map(|e| EngineId::parse(e).ok()) {
        if !providers.contains(&id.provider) {
            providers.push(id.provider);
        }
    }
    providers
}

/// Fill in a key for every provider in `providers`.
///
/// `env` looks up environment variables. When `interactive` is set, a
/// provider still without a key is asked for one on `output`, and the
/// answer is read from `input`; an empty answer leaves the provider without
/// a key.
pub fn resolve_api_keys<R, W>(
    stored: &HashMap<String, String>,
    providers: &[String],
    interactive: bool,
    env: impl Fn(&str) -> Option<String>,
    input: &mut R,
    output: &mut W,
) -> Result<ResolvedKeys, String>
where
    R: BufRead,
    W: Write,
{
    let mut resolved = ResolvedKeys {
        keys: stored.clone(),
        entered: HashMap::new(),
    };

    for provider in providers {
        if resolved.keys.contains_key(provider) {
            continue;
        }

        let var = env_var_name(provider);
        if let Some(key) = env(&var).filter(|k| !k.trim().is_empty()) {
            debug!("Using API key for {provider} from {var}");
            resolved.keys.insert(provider.clone(), key.trim().to_string());
            continue;
        }

        if !interactive {
            continue;
        }

        writeln!(output, "Enter API key for {provider}:")
            .and_then(|()| output.flush())
            .map_err(|e| format!("failed to write to stdout: {e}"))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| format!("failed to read API key from stdin: {e}"))?;
        if read == 0 {
            return Err("failed to read API key from stdin: end of input".to_string());
        }

        let key = line.trim();
        if key.is_empty() {
            continue;
        }

        info!("API key for {provider} entered interactively");
        resolved.keys.insert(provider.clone(), key.to_string());
        resolved.entered.insert(provider.clone(), key.to_string());
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn env_names() {
        assert_eq!(env_var_name("openai"), "OPENAI_API_KEY");
        assert_eq!(env_var_name("my-llm"), "MY_LLM_API_KEY");
    }

    #[test]
    fn providers_are_distinct_and_ordered() {
        let engines: Vec<String> = vec![
            "openai:gpt-4".into(),
            "cohere".into(),
            "openai".into(),
            ":bad".into(),
        ];
        assert_eq!(providers_for(&engines), vec!["openai", "cohere"]);
    }

    #[test]
    fn stored_keys_win_and_env_fills_gaps() {
        let stored = HashMap::from([("openai".to_string(), "from-file".to_string())]);
        let env = |name: &str| (name == "COHERE_API_KEY").then(|| "from-env".to_string());

        let mut out = Vec::new();
        let resolved = resolve_api_keys(
            &stored,
            &["openai".into(), "cohere".into()],
            true,
            env,
            &mut Cursor::new(""),
            &mut out,
        )
        .unwrap();

        assert_eq!(resolved.keys["openai"], "from-file");
        assert_eq!(resolved.keys["cohere"], "from-env");
        assert!(resolved.entered.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn prompts_for_missing_keys() {
        let mut out = Vec::new();
        let resolved = resolve_api_keys(
            &HashMap::new(),
            &["openai".into(), "cohere".into()],
            true,
            no_env,
            &mut Cursor::new("  sk-typed  \n\n"),
            &mut out,
        )
        .unwrap();

        assert_eq!(resolved.entered["openai"], "sk-typed");
        assert!(!resolved.keys.contains_key("cohere"));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(
            shown,
            "Enter API key for openai:\nEnter API key for cohere:\n"
        );
    }

    #[test]
    fn batch_mode_never_prompts() {
        let mut out = Vec::new();
        let resolved = resolve_api_keys(
            &HashMap::new(),
            &["openai".into()],
            false,
            no_env,
            &mut Cursor::new("sk-ignored\n"),
            &mut out,
        )
        .unwrap();
        assert!(resolved.keys.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn closed_stdin_is_an_error() {
        let err = resolve_api_keys(
            &HashMap::new(),
            &["openai".into()],
            true,
            no_env,
            &mut Cursor::new(""),
            &mut Vec::<u8>::new(),
        )
        .err()
        .unwrap();
        assert!(err.contains("end of input"));
    }
}
