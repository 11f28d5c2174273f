use minegym_core::*;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::Serialize;

/// Picks uniformly among the actions that would not be repeats.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    rng: SmallRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn act(&mut self, episode: &Episode) -> Option<usize> {
        let legal: Vec<usize> = episode
            .action_mask()
            .into_iter()
            .enumerate()
            .filter_map(|(action, legal)| legal.then_some(action))
            .collect();
        if legal.is_empty() {
            return None;
        }
        Some(legal[self.rng.random_range(0..legal.len())])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub seed: Option<u64>,
    pub status: EpisodeStatus,
    pub steps: u32,
    pub total_reward: f32,
    pub revealed: CellCount,
    pub safe_cells: CellCount,
    /// Stopped by the step limit before reaching a terminal state.
    pub truncated: bool,
}

/// Plays one episode to the end, or until `max_steps` steps were taken.
pub fn run_episode(
    env: &mut Env,
    agent: &mut RandomAgent,
    index: u32,
    max_steps: Option<u32>,
) -> Result<(EpisodeSummary, Observation)> {
    let (mut observation, info) = env.reset(None)?;
    let mut truncated = false;

    loop {
        let Some(episode) = env.episode() else {
            return Err(EnvError::NotReset);
        };
        if episode.is_terminal() {
            break;
        }
        if max_steps.is_some_and(|max_steps| episode.steps() >= max_steps) {
            log::debug!("Episode {index} truncated after {} steps", episode.steps());
            truncated = true;
            break;
        }
        let Some(action) = agent.act(episode) else {
            break;
        };

        let step = env.step(action)?;
        observation = step.observation;
    }

    let episode = env.episode().ok_or(EnvError::NotReset)?;
    let summary = EpisodeSummary {
        episode: index,
        seed: info.seed,
        status: episode.status(),
        steps: episode.steps(),
        total_reward: episode.total_reward(),
        revealed: episode.revealed_count(),
        safe_cells: episode.board().safe_cell_count(),
        truncated,
    };
    Ok((summary, observation))
}
