use super::commands::config::ConfigCommands;
use super::commands::query::QueryArgs;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "m365-query")]
#[command(
    version,
    about = "Compose and run OData queries against SharePoint REST and Microsoft Graph"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the OData query string without executing it
    Compose(QueryArgs),
    /// Execute the query and print the rows as JSON
    Run(QueryArgs),
    /// Configuration management
    Config(ConfigCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Transport;

    #[test]
    fn test_parse_compose() {
        let cli = Cli::try_parse_from([
            "m365-query",
            "compose",
            "--transport",
            "graph",
            "--where",
            "Title == 'Docs'",
            "--where",
            "!Hidden",
            "--select",
            "Id,Title",
            "--orderby",
            "Created:desc",
            "--top",
            "10",
        ])
        .unwrap();

        match cli.command {
            Commands::Compose(args) => {
                assert_eq!(args.transport, Some(Transport::Graph));
                assert_eq!(args.filters.len(), 2);
                assert_eq!(args.select, vec!["Id", "Title"]);
                assert_eq!(args.top, Some(10));
            }
            _ => panic!("expected compose"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["m365-query", "config", "show", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
