//! Command-line front end for askai-rs.
//!
//! The `askai` binary reads a prompt from its arguments and optional
//! context from piped stdin, then asks one or more engines through the
//! [`askai_rs::Dispatcher`] and prints their answers.
//!
//! ```sh
//! askai "What is a monad?"
//! git diff | askai -p "Write a commit message" -e openai:gpt-4
//! cat report.txt | askai -p "Key risks?" --all-engines --print-engine
//! ```
//!
//! The library half holds everything the binary does apart from wiring:
//! [`config`] (the JSON config file), [`keys`] (API-key completion),
//! [`input`] (stdin), [`logging`] and [`cli`] (flags and output).

pub mod cli;
pub mod config;
pub mod input;
pub mod keys;
pub mod logging;

pub use cli::Cli;
pub use config::AppConfig;
