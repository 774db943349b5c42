use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill: resume submissions committed straight to a site repository",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to quill.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sanitize a resume file and commit it to the configured repository
    Submit(SubmitArgs),
    /// Sanitize a resume file and print the stored form, without committing
    Validate(ValidateArgs),
    /// Run the HTTP submission endpoint
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Resume JSON file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Resume JSON file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override server.bind_addr
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit() {
        let cli = Cli::try_parse_from(["quill", "submit", "ada.json", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Submit(args) => assert_eq!(args.file, PathBuf::from("ada.json")),
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["quill", "serve", "--config", "q.toml", "--bind", "0.0.0.0:80"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("q.toml")));
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind.unwrap().port(), 80),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn validate_requires_a_file() {
        assert!(Cli::try_parse_from(["quill", "validate"]).is_err());
    }
}
