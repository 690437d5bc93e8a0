use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal front end for Taskwarrior.
/// Runs the interactive UI when no command is given.
#[derive(Parser)]
#[command(name = "tsakarori", version, about = "Browse and edit Taskwarrior tasks in the terminal")]
pub struct Cli {
    /// Use a JSON task store at this path instead of Taskwarrior.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Taskwarrior executable. Overrides `task_bin` from the config file.
    #[arg(long, global = true)]
    pub task_bin: Option<PathBuf>,

    /// Path to the config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the log file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::GroupBy;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_with_global_flags() {
        let cli = Cli::parse_from([
            "tsakarori", "list", "--all", "--group", "tag", "--store", "tasks.json",
        ]);
        assert_eq!(cli.store, Some(PathBuf::from("tasks.json")));
        match cli.command {
            Some(Commands::List { all, group, .. }) => {
                assert!(all);
                assert_eq!(group, Some(GroupBy::Tag));
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn no_command_means_tui() {
        let cli = Cli::parse_from(["tsakarori"]);
        assert!(cli.command.is_none());
    }
}
