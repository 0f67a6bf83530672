use std::path::PathBuf;

use clap::Parser;

use crate::config;

#[derive(Parser, Debug)]
#[command(name = "confetti-aero")]
#[command(about = "Confetti falling, drifting and sticking in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Project file with obstacles, settings and backdrop aspect ratio
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Seed for particle emission
    #[arg(long, default_value_t = config::DEFAULT_SEED)]
    pub seed: u64,

    /// Run the director timeline on repeat
    #[arg(long)]
    pub auto_loop: bool,

    /// Start a director recording right away
    #[arg(long)]
    pub record: bool,

    /// Step the simulation without a terminal and print the final stats
    #[arg(long)]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = config::LOOP_FRAMES)]
    pub frames: u64,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["confetti-aero"]);
        assert_eq!(cli.seed, config::DEFAULT_SEED);
        assert_eq!(cli.frames, 1800);
        assert!(cli.project.is_none());
        assert!(!cli.headless);
    }

    #[test]
    fn headless_flags() {
        let cli = Cli::parse_from([
            "confetti-aero",
            "--headless",
            "--frames",
            "120",
            "--seed",
            "7",
            "-p",
            "scene.json",
            "-vv",
        ]);
        assert!(cli.headless);
        assert_eq!(cli.frames, 120);
        assert_eq!(cli.seed, 7);
        assert_eq!(cli.project, Some(PathBuf::from("scene.json")));
        assert_eq!(cli.verbose, 2);
    }
}
