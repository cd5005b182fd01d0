//! PAE Quest Control - terminal client for the PAE confidence game
//!
//! Browse proteins, render confidence grids, play and track progress.

mod commands;
mod display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{Context, GameOptions};
use pae_common::{Audience, Difficulty, GameConfig, GameMode, MapType};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paectl")]
#[command(about = "PAE Quest - learn to read AlphaFold confidence maps", long_about = None)]
#[command(version = pae_common::VERSION)]
struct Cli {
    /// Config file (default: $PAE_CONFIG, then the user and system config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available proteins
    Proteins,

    /// Show a protein's reference text
    Show {
        id: String,

        /// elementary, highSchool or undergraduate
        #[arg(long)]
        audience: Option<Audience>,
    },

    /// Render a confidence grid
    Grid {
        #[arg(long)]
        protein: Option<String>,

        /// full, domain or interface
        #[arg(long)]
        map: Option<MapType>,

        #[arg(long)]
        size: Option<usize>,
    },

    /// Play: pick cells and answer questions
    Play {
        #[arg(long)]
        protein: Option<String>,

        #[arg(long)]
        map: Option<MapType>,

        #[arg(long)]
        size: Option<usize>,

        /// beginner, intermediate or advanced
        #[arg(long)]
        difficulty: Option<Difficulty>,

        #[arg(long)]
        audience: Option<Audience>,

        /// tutorial, challenge or explore
        #[arg(long)]
        mode: Option<GameMode>,

        /// Questions to play
        #[arg(long, default_value_t = 5)]
        rounds: usize,
    },

    /// Take a short quiz about a protein's map
    Quiz {
        #[arg(long)]
        protein: Option<String>,

        #[arg(long)]
        difficulty: Option<Difficulty>,

        #[arg(long)]
        audience: Option<Audience>,
    },

    /// Show level, experience and stats
    Progress,

    /// List achievements
    Achievements,

    /// Reset all progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GameConfig::load(cli.config.as_deref())?;
    let ctx = Context::from_config(config, std::io::stdout().is_terminal())?;

    match cli.command {
        Commands::Proteins => commands::proteins(&ctx),
        Commands::Show { id, audience } => commands::show(&ctx, &id, audience),
        Commands::Grid { protein, map, size } => {
            let options = GameOptions {
                protein,
                map,
                size,
                ..Default::default()
            };
            commands::grid(&ctx, &options)
        }
        Commands::Play {
            protein,
            map,
            size,
            difficulty,
            audience,
            mode,
            rounds,
        } => {
            let options = GameOptions {
                protein,
                map,
                size,
                difficulty,
                audience,
                mode,
            };
            commands::play(&ctx, &options, rounds)
        }
        Commands::Quiz {
            protein,
            difficulty,
            audience,
        } => {
            let options = GameOptions {
                protein,
                difficulty,
                audience,
                ..Default::default()
            };
            commands::quiz(&ctx, &options)
        }
        Commands::Progress => commands::progress(&ctx),
        Commands::Achievements => commands::achievements(&ctx),
        Commands::Reset { yes } => commands::reset(&ctx, yes),
    }
}
