use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use tr_protocol::PayloadType;

#[derive(Parser, Debug)]
#[command(name = "tracerail")]
#[command(about = "Watch requests travel through a pipeline of microservices")]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Gateway base URL; overrides the config file and environment.
    #[arg(long, global = true, value_name = "URL")]
    pub gateway: Option<String>,

    /// Action to perform. If omitted, starts the interactive TUI.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit one request and print its progress.
    Run(RunArgs),

    /// Show or replace the gateway's pipeline.
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },

    /// Inspect and manage the local run history.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("payload")
        .required(true)
        .args(["text", "json", "media_type"])
))]
pub struct RunArgs {
    /// Submit plain text.
    #[arg(long)]
    pub text: Option<String>,

    /// Submit a JSON document, given inline.
    #[arg(long)]
    pub json: Option<String>,

    /// Submit a file as base64 media or binary data.
    #[arg(long = "type", value_enum, requires = "data_file")]
    pub media_type: Option<MediaType>,

    /// File read for `--type`.
    #[arg(long, value_name = "PATH", requires = "media_type")]
    pub data_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    Binary,
}

impl From<MediaType> for PayloadType {
    fn from(value: MediaType) -> Self {
        match value {
            MediaType::Image => PayloadType::Image,
            MediaType::Video => PayloadType::Video,
            MediaType::Binary => PayloadType::Binary,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// Print the configured services in order.
    Show {
        /// Print the raw service list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace the pipeline with the services in FILE (YAML or JSON).
    Set {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List recorded runs, newest first.
    List {
        /// Show at most N runs.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Write the export document to a file, or stdout when omitted.
    Export {
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Merge runs from an export document.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete every recorded run.
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_tui() {
        let cli = Cli::try_parse_from(["tracerail", "--gateway", "http://gw:8080"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.gateway.as_deref(), Some("http://gw:8080"));
    }

    #[test]
    fn test_run_requires_exactly_one_payload() {
        assert!(Cli::try_parse_from(["tracerail", "run"]).is_err());
        assert!(Cli::try_parse_from(["tracerail", "run", "--text", "a", "--json", "{}"]).is_err());
        assert!(Cli::try_parse_from(["tracerail", "run", "--type", "image"]).is_err());

        let cli = Cli::try_parse_from([
            "tracerail",
            "run",
            "--type",
            "video",
            "--data-file",
            "clip.mp4",
        ])
        .unwrap();
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.media_type, Some(MediaType::Video));
        assert_eq!(args.data_file, Some(PathBuf::from("clip.mp4")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tracerail", "history", "list", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            cli.command,
            Some(Command::History {
                command: HistoryCommand::List { limit: 20 }
            })
        ));
    }
}
