//! CLI module for TokenDiff
//!
//! - `run`: invoke the prompt and compare token usage (default)
//! - `lights`: print the mock light collection

use clap::{Parser, Subcommand};

mod lights;
mod report;
mod run;

/// TokenDiff CLI
#[derive(Parser, Debug)]
#[command(name = "tokendiff")]
#[command(about = "Compare library-reported and HTTP-observed LLM token usage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke the prompt with the lights plugin and print both usage reports (default)
    Run {
        /// Prompt to send instead of the configured one
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Print the mock lights as JSON
    Lights,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run { prompt }) => run::run(prompt).await,
        Some(Commands::Lights) => lights::run(),
        None => run::run(None).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["tokendiff"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_run_with_prompt() {
        let cli = Cli::try_parse_from(["tokendiff", "run", "--prompt", "Dim the porch light"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run { prompt: Some(p) }) if p == "Dim the porch light"
        ));
    }

    #[test]
    fn test_parse_lights() {
        let cli = Cli::try_parse_from(["tokendiff", "lights"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Lights)));
    }
}
