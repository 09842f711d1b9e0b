//! Download queue subcommands.

use clap::Subcommand;

use crate::commands::FetchArgs;

/// `gvd queue` commands. Items are addressed by the id `list` prints.
#[derive(Subcommand)]
pub enum QueueCommand {
    /// Show queued downloads and their state
    List {
        /// Print the queue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a download; the title is looked up unless given
    Add {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Title to show instead of asking yt-dlp
        #[arg(long)]
        title: Option<String>,
    },

    /// Remove one download, stopping it if it is running
    Remove {
        /// Item id
        id: String,
    },

    /// Remove every download
    Clear,

    /// Run queued downloads one after another
    Run {
        /// Install missing tools before starting
        #[arg(long)]
        install_missing: bool,

        /// Hide yt-dlp output and show only progress
        #[arg(short, long)]
        quiet: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::Commands;
    use crate::parser::Cli;

    fn queue(args: &[&str]) -> QueueCommand {
        let mut argv = vec!["gvd", "queue"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Some(Commands::Queue { command }) => command,
            _ => panic!("expected queue"),
        }
    }

    #[test]
    fn test_add_takes_fetch_args() {
        match queue(&["add", "https://example.com/v", "-x", "--title", "Talk"]) {
            QueueCommand::Add { fetch, title } => {
                assert_eq!(fetch.url, "https://example.com/v");
                assert!(fetch.audio);
                assert_eq!(title.as_deref(), Some("Talk"));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_run_flags() {
        assert!(matches!(
            queue(&["run", "--quiet"]),
            QueueCommand::Run { quiet: true, install_missing: false }
        ));
    }
}
