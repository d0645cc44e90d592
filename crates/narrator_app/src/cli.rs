use std::path::PathBuf;

use clap::{Parser, Subcommand};
use narrator_core::Language;

#[derive(Debug, Parser)]
#[command(name = "narrator", version, about = "Chess game commentary from recent archives")]
pub struct Cli {
    /// RON configuration file. `narrator.ron` is read if present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "URL", env = "NARRATOR_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Signed-in user; generation is refused without one.
    #[arg(long, value_name = "ID", env = "NARRATOR_USER_ID")]
    pub user_id: Option<String>,

    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write the log to ./narrator.log.
    #[arg(long)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch and list a player's recent games.
    Games {
        username: String,

        /// Number of most recent archive months to fetch.
        #[arg(short, long)]
        months: Option<usize>,

        /// Keep going when a month cannot be fetched.
        #[arg(long)]
        skip_failed_months: bool,
    },
    /// Generate commentary for a game from the last `games` listing.
    Generate {
        /// 1-based position in the last listing.
        #[arg(short, long)]
        game: usize,

        #[arg(short = 'L', long, default_value_t = Language::English)]
        language: Language,

        /// Stored voice sample to clone instead of the standard voice.
        #[arg(long, value_name = "REF")]
        voice_sample: Option<String>,

        /// Save the audio to the output directory when done.
        #[arg(short, long)]
        download: bool,
    },
    /// List previously generated commentaries.
    Recordings {
        /// Save one recording, by its position in the listing or its id.
        #[arg(short, long, value_name = "N|ID")]
        download: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn games_defaults() {
        let cli = Cli::try_parse_from(["narrator", "games", "Hikaru"]).expect("parse");
        assert!(cli.config.is_none());
        assert!(!cli.log_file);
        assert_eq!(
            cli.command,
            Command::Games {
                username: "Hikaru".to_string(),
                months: None,
                skip_failed_months: false,
            }
        );
    }

    #[test]
    fn games_with_window_and_skip() {
        let cli = Cli::try_parse_from([
            "narrator",
            "--config",
            "/etc/narrator.ron",
            "games",
            "MagnusCarlsen",
            "-m",
            "6",
            "--skip-failed-months",
        ])
        .expect("parse");
        assert_eq!(cli.config.unwrap(), PathBuf::from("/etc/narrator.ron"));
        assert_eq!(
            cli.command,
            Command::Games {
                username: "MagnusCarlsen".to_string(),
                months: Some(6),
                skip_failed_months: true,
            }
        );
    }

    #[test]
    fn generate_parses_language_case_insensitively() {
        let cli = Cli::try_parse_from([
            "narrator",
            "--user-id",
            "user-1",
            "generate",
            "--game",
            "3",
            "--language",
            "german",
            "--voice-sample",
            "samples/me.wav",
            "--download",
        ])
        .expect("parse");
        assert_eq!(cli.user_id.as_deref(), Some("user-1"));
        assert_eq!(
            cli.command,
            Command::Generate {
                game: 3,
                language: Language::German,
                voice_sample: Some("samples/me.wav".to_string()),
                download: true,
            }
        );
    }

    #[test]
    fn generate_defaults_to_english() {
        let cli = Cli::try_parse_from(["narrator", "generate", "-g", "1"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Generate {
                language: Language::English,
                download: false,
                ..
            }
        ));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = Cli::try_parse_from(["narrator", "generate", "-g", "1", "-L", "Klingon"])
            .unwrap_err();
        assert!(err.to_string().contains("Klingon"));
    }

    #[test]
    fn recordings_download_selector() {
        let cli = Cli::try_parse_from(["narrator", "recordings"]).expect("parse");
        assert_eq!(cli.command, Command::Recordings { download: None });

        let cli =
            Cli::try_parse_from(["narrator", "recordings", "--download", "2"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Recordings {
                download: Some("2".to_string())
            }
        );
    }

    #[test]
    fn generate_requires_a_game() {
        assert!(Cli::try_parse_from(["narrator", "generate"]).is_err());
    }
}
