use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use minegym_core::{Env, EpisodeStatus};

use rollout::{RandomAgent, run_episode};
use settings::{Overrides, Preset};

mod logging;
mod rollout;
mod settings;

/// Play Minesweeper episodes with a uniformly random agent and report how they went.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// TOML environment config, the flags below take priority over it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board size and mine count preset
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    #[arg(long)]
    rows: Option<u8>,

    #[arg(long)]
    cols: Option<u8>,

    #[arg(short, long)]
    mines: Option<u16>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// How many episodes to play
    #[arg(short = 'n', long, default_value_t = 10)]
    episodes: u32,

    /// Cut episodes short after this many steps
    #[arg(long)]
    max_steps: Option<u32>,

    /// Print one JSON object per episode instead of text
    #[arg(long)]
    json: bool,

    /// Print the final board of every episode
    #[arg(long)]
    show: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose.log_level_filter());

    let base = args
        .config
        .as_deref()
        .map(settings::load_config)
        .transpose()?;
    let overrides = Overrides {
        preset: args.preset,
        rows: args.rows,
        cols: args.cols,
        mines: args.mines,
        seed: args.seed,
    };
    let config = settings::resolve(base, &overrides)?;
    log::info!(
        "Playing {} episodes on {}x{} with {} mines, seed {:?}",
        args.episodes,
        config.rows(),
        config.cols(),
        config.mines,
        config.seed
    );

    let mut env = Env::new(config)?;
    let mut agent = RandomAgent::new(config.seed.unwrap_or_default().rotate_left(32));

    let mut wins = 0u32;
    let mut reward_sum = 0f64;
    for index in 0..args.episodes {
        let (summary, observation) = run_episode(&mut env, &mut agent, index, args.max_steps)?;
        if summary.status == EpisodeStatus::Won {
            wins += 1;
        }
        reward_sum += f64::from(summary.total_reward);

        if args.json {
            let line = serde_json::to_string(&summary).context("Could not serialize summary")?;
            println!("{line}");
        } else {
            println!(
                "episode {:>4}: {:<6} steps {:>4} reward {:>9.1} revealed {}/{}{}",
                summary.episode,
                format!("{:?}", summary.status),
                summary.steps,
                summary.total_reward,
                summary.revealed,
                summary.safe_cells,
                if summary.truncated { " (truncated)" } else { "" }
            );
        }
        if args.show {
            print!("{observation}");
        }
    }

    if args.episodes > 0 && !args.json {
        println!(
            "won {wins}/{} episodes, mean reward {:.2}",
            args.episodes,
            reward_sum / f64::from(args.episodes)
        );
    }
    Ok(())
}
