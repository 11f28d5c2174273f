use alloc::vec::Vec;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Seed of the environment's own generator when [`EnvConfig::seed`] is not set.
pub const DEFAULT_SEED: u64 = 0x6d69_6e65_6779_6d00;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    Active,
    Won,
    Lost,
}

impl EpisodeStatus {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for EpisodeStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Target was already revealed or flagged, nothing changed.
    Repeated,
    Revealed,
    HitMine,
    Won,
}

impl StepOutcome {
    pub const fn has_update(self) -> bool {
        use StepOutcome::*;
        match self {
            Repeated => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}

/// All the state of a single play-through. Replaced as a whole on every reset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Episode {
    seed: Option<u64>,
    board: HiddenBoard,
    revealed: CellMask,
    flagged: CellMask,
    hit_mine: Option<Coord2>,
    status: EpisodeStatus,
    steps: u32,
    total_reward: f32,
}

impl Episode {
    pub fn new(board: HiddenBoard, seed: Option<u64>) -> Self {
        let size = board.size();
        Self {
            seed,
            board,
            revealed: CellMask::new(size),
            flagged: CellMask::new(size),
            hit_mine: None,
            status: Default::default(),
            steps: 0,
            total_reward: 0.0,
        }
    }

    /// Seed the board was generated from, `None` for boards handed in by the caller.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn board(&self) -> &HiddenBoard {
        &self.board
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn revealed(&self) -> &CellMask {
        &self.revealed
    }

    pub fn flagged(&self) -> &CellMask {
        &self.flagged
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed.len()
    }

    pub fn hit_mine(&self) -> Option<Coord2> {
        self.hit_mine
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    pub fn observation(&self) -> Observation {
        Observation::derive(&self.board, &self.revealed, self.hit_mine)
    }

    pub fn is_won(&self) -> bool {
        is_won(&self.board, &self.revealed)
    }

    pub fn can_act_at(&self, coords: Coord2) -> bool {
        self.status.is_active()
            && self.board.contains(coords)
            && !self.revealed.contains(coords)
            && !self.flagged.contains(coords)
    }

    /// One entry per action, `true` where stepping would not be a repeat. All `false` once the episode ended.
    pub fn action_mask(&self) -> Vec<bool> {
        let (rows, cols) = self.size();
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|coords| self.can_act_at(coords))
            .collect()
    }

    fn apply(&mut self, coords: Coord2, rewards: &RewardConfig) -> (StepOutcome, f32, CellCount) {
        use StepOutcome::*;

        let (outcome, reward, newly_revealed) =
            if self.revealed.contains(coords) || self.flagged.contains(coords) {
                (Repeated, rewards.repeat, 0)
            } else {
                match self.board.cell(coords) {
                    HiddenCell::Mine => {
                        self.hit_mine = Some(coords);
                        self.revealed.insert(coords);
                        self.status = EpisodeStatus::Lost;
                        (HitMine, rewards.loss, 1)
                    }
                    HiddenCell::Clear(count) => {
                        let newly_revealed = reveal(coords, &self.board, &mut self.revealed);
                        if self.is_won() {
                            self.status = EpisodeStatus::Won;
                            (Won, rewards.win, newly_revealed)
                        } else if count == 0 {
                            (Revealed, rewards.open_region, newly_revealed)
                        } else {
                            (Revealed, rewards.reveal, newly_revealed)
                        }
                    }
                }
            };

        self.steps = self.steps.saturating_add(1);
        self.total_reward += reward;
        (outcome, reward, newly_revealed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetInfo {
    pub seed: Option<u64>,
    pub size: Coord2,
    pub mines: CellCount,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub coords: Coord2,
    pub outcome: StepOutcome,
    pub newly_revealed: CellCount,
    pub revealed_count: CellCount,
    pub status: EpisodeStatus,
}

/// Result of [`Env::step`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    /// Always `false`, time limits are left to the caller.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Minesweeper environment with a reset/step interface. Holds at most one episode at a time.
#[derive(Clone, Debug)]
pub struct Env {
    config: EnvConfig,
    rng: SmallRng,
    episode: Option<Episode>,
}

impl Env {
    pub fn new(config: EnvConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: SmallRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED)),
            episode: None,
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn action_space(&self) -> ActionSpace {
        self.config.action_space()
    }

    /// Current episode, if any, for read-only inspection.
    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    /// Starts a new episode on a freshly generated board. Passing a seed also reseeds the generator used for
    /// later unseeded resets.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, ResetInfo)> {
        let episode_seed = match seed {
            Some(seed) => {
                self.rng = SmallRng::seed_from_u64(seed);
                seed
            }
            None => self.rng.random(),
        };

        let board = RandomBoardGenerator::new(episode_seed).generate(&self.config)?;
        Ok(self.start(Episode::new(board, Some(episode_seed))))
    }

    /// Starts a new episode on a given board, which must match the configured size.
    pub fn reset_with_board(&mut self, board: HiddenBoard) -> Result<(Observation, ResetInfo)> {
        if board.size() != self.config.size {
            let (rows, cols) = board.size();
            return Err(EnvError::InvalidDimensions { rows, cols });
        }
        Ok(self.start(Episode::new(board, None)))
    }

    fn start(&mut self, episode: Episode) -> (Observation, ResetInfo) {
        let info = ResetInfo {
            seed: episode.seed(),
            size: episode.size(),
            mines: episode.board().mine_count(),
        };
        log::debug!(
            "Environment reset, {}x{} with {} mines, seed {:?}",
            info.size.0,
            info.size.1,
            info.mines,
            info.seed
        );

        let observation = Observation::hidden(info.size);
        self.episode = Some(episode);
        (observation, info)
    }

    pub fn step(&mut self, action: usize) -> Result<Step> {
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;
        if episode.is_terminal() {
            return Err(EnvError::EpisodeFinished);
        }

        let coords = self.config.action_space().decode(action)?;
        let (outcome, reward, newly_revealed) = episode.apply(coords, &self.config.rewards);
        log::trace!(
            "Step {} at {:?}: {:?}, reward {}, {} newly revealed",
            episode.steps(),
            coords,
            outcome,
            reward,
            newly_revealed
        );

        let status = episode.status();
        if status.is_terminal() {
            log::debug!(
                "Episode ended {:?} after {} steps, total reward {}",
                status,
                episode.steps(),
                episode.total_reward()
            );
        }

        Ok(Step {
            observation: episode.observation(),
            reward,
            terminated: status.is_terminal(),
            truncated: false,
            info: StepInfo {
                coords,
                outcome,
                newly_revealed,
                revealed_count: episode.revealed_count(),
                status,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REWARDS: RewardConfig = RewardConfig::DEFAULT;

    fn env_with_board(size: Coord2, mines: &[Coord2]) -> Env {
        let board = HiddenBoard::from_mine_coords(size, mines).unwrap();
        let config = EnvConfig::new(size, board.mine_count()).unwrap();
        let mut env = Env::new(config).unwrap();
        env.reset_with_board(board).unwrap();
        env
    }

    #[test]
    fn reset_starts_hidden_and_active() {
        let mut env = Env::new(EnvConfig::default()).unwrap();

        let (obs, info) = env.reset(Some(3)).unwrap();

        assert_eq!(obs.hidden_count(), 81);
        assert_eq!(info.seed, Some(3));
        assert_eq!(info.mines, 10);
        let episode = env.episode().unwrap();
        assert_eq!(episode.status(), EpisodeStatus::Active);
        assert!(episode.revealed().is_empty());
        assert!(episode.flagged().is_empty());
        assert_eq!(episode.board().mine_count(), 10);
    }

    #[test]
    fn seeded_resets_are_reproducible() {
        let mut a = Env::new(EnvConfig::intermediate()).unwrap();
        let mut b = Env::new(EnvConfig::intermediate()).unwrap();

        a.reset(Some(99)).unwrap();
        b.reset(Some(99)).unwrap();
        assert_eq!(a.episode().unwrap().board(), b.episode().unwrap().board());

        a.reset(None).unwrap();
        b.reset(None).unwrap();
        assert_eq!(a.episode().unwrap().board(), b.episode().unwrap().board());
    }

    #[test]
    fn step_before_reset_is_invalid_state() {
        let mut env = Env::new(EnvConfig::default()).unwrap();

        let err = env.step(0).unwrap_err();

        assert_eq!(err, EnvError::NotReset);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn zero_cell_reveals_open_region() {
        // . 2 * 2 .
        // . 2 * 2 .
        let mut env = env_with_board((2, 5), &[(0, 2), (1, 2)]);

        let step = env.step(5).unwrap();

        assert_eq!(step.reward, REWARDS.open_region);
        assert!(!step.terminated);
        assert!(!step.truncated);
        assert_eq!(step.info.coords, (1, 0));
        assert_eq!(step.info.outcome, StepOutcome::Revealed);
        assert_eq!(step.info.newly_revealed, 4);
        assert_eq!(step.observation[(0, 0)], ObservedCell::Revealed(0));
        assert_eq!(step.observation[(0, 1)], ObservedCell::Revealed(2));
        assert_eq!(step.observation[(1, 1)], ObservedCell::Revealed(2));
        assert_eq!(step.observation[(0, 3)], ObservedCell::Hidden);
        assert_eq!(step.observation[(1, 4)], ObservedCell::Hidden);
    }

    #[test]
    fn hitting_a_mine_ends_the_episode() {
        let mut env = env_with_board((3, 3), &[(0, 0)]);

        let step = env.step(0).unwrap();

        assert_eq!(step.observation[(0, 0)], ObservedCell::MineHit);
        assert_eq!(step.reward, REWARDS.loss);
        assert!(step.terminated);
        assert_eq!(step.info.status, EpisodeStatus::Lost);
        assert_eq!(env.episode().unwrap().hit_mine(), Some((0, 0)));

        let err = env.step(4).unwrap_err();
        assert_eq!(err, EnvError::EpisodeFinished);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn repeated_action_is_penalised_without_change() {
        let mut env = env_with_board((3, 3), &[(0, 0), (2, 2)]);

        let first = env.step(4).unwrap();
        let second = env.step(4).unwrap();

        assert_eq!(first.reward, REWARDS.reveal);
        assert_eq!(second.reward, REWARDS.repeat);
        assert_eq!(second.observation, first.observation);
        assert_eq!(second.terminated, first.terminated);
        assert_eq!(second.info.outcome, StepOutcome::Repeated);
        assert!(!second.info.outcome.has_update());
        assert_eq!(second.info.newly_revealed, 0);
        assert_eq!(env.episode().unwrap().steps(), 2);
    }

    #[test]
    fn step_counter_saturates_on_endless_repeats() {
        let mut env = env_with_board((3, 3), &[(0, 0), (2, 2)]);
        env.step(4).unwrap();
        env.episode.as_mut().unwrap().steps = u32::MAX;

        let step = env.step(4).unwrap();

        assert_eq!(step.info.outcome, StepOutcome::Repeated);
        assert_eq!(env.episode().unwrap().steps(), u32::MAX);
    }

    #[test]
    fn reset_with_loaded_board_keeps_true_counts() {
        // stored boards only carry their mine mask, the numbers are always recomputed
        let stored = serde_json::json!({
            "v": 1,
            "dim": [3, 3],
            "data": [true, false, false, false, false, false, false, false, false],
        });
        let board: HiddenBoard = serde_json::from_value(stored).unwrap();
        let mut env = Env::new(EnvConfig::new((3, 3), 1).unwrap()).unwrap();
        env.reset_with_board(board).unwrap();

        let step = env.step(4).unwrap();

        assert_eq!(step.observation[(1, 1)], ObservedCell::Revealed(1));
        assert!(!step.terminated);
    }

    #[test]
    fn loaded_board_with_too_many_mines_is_rejected() {
        let full = serde_json::json!({"v": 1, "dim": [1, 2], "data": [true, true]});
        assert!(serde_json::from_value::<HiddenBoard>(full).is_err());

        // cached counts can no longer be smuggled in next to the mask
        let with_counts = serde_json::json!({
            "mine_mask": {"v": 1, "dim": [1, 2], "data": [true, false]},
            "mine_count": 50,
        });
        assert!(serde_json::from_value::<HiddenBoard>(with_counts).is_err());
    }

    #[test]
    fn revealing_last_safe_cell_wins() {
        let mut env = env_with_board((1, 3), &[(0, 0)]);

        let first = env.step(1).unwrap();
        assert_eq!(first.reward, REWARDS.reveal);
        assert!(!first.terminated);

        let second = env.step(2).unwrap();
        assert_eq!(second.reward, REWARDS.win);
        assert!(second.terminated);
        assert_eq!(second.info.outcome, StepOutcome::Won);
        assert_eq!(env.episode().unwrap().status(), EpisodeStatus::Won);
        assert_eq!(env.step(1).unwrap_err(), EnvError::EpisodeFinished);
    }

    #[test]
    fn open_region_win_overrides_region_reward() {
        let mut env = env_with_board((3, 3), &[(0, 0)]);

        let step = env.step(8).unwrap();

        // the whole board opens up from the far corner
        assert_eq!(step.info.outcome, StepOutcome::Won);
        assert_eq!(step.reward, REWARDS.win);
        assert!(step.terminated);
        assert_eq!(step.observation[(2, 2)], ObservedCell::Revealed(0));
        assert_eq!(step.observation[(1, 1)], ObservedCell::Revealed(1));
        assert_eq!(step.observation[(0, 0)], ObservedCell::Hidden);
    }

    #[test]
    fn out_of_range_action_leaves_episode_untouched() {
        let mut env = env_with_board((3, 3), &[(0, 0)]);

        let err = env.step(9).unwrap_err();

        assert_eq!(err, EnvError::InvalidAction { action: 9, cells: 9 });
        assert_eq!(err.kind(), ErrorKind::InvalidAction);
        let episode = env.episode().unwrap();
        assert_eq!(episode.steps(), 0);
        assert!(episode.revealed().is_empty());
    }

    #[test]
    fn reset_replaces_finished_episode() {
        let mut env = env_with_board((3, 3), &[(0, 0)]);
        env.step(0).unwrap();

        let (obs, _) = env.reset(Some(1)).unwrap();

        assert_eq!(obs, Observation::hidden((3, 3)));
        let episode = env.episode().unwrap();
        assert_eq!(episode.status(), EpisodeStatus::Active);
        assert_eq!(episode.hit_mine(), None);
        assert_eq!(episode.steps(), 0);
    }

    #[test]
    fn reset_with_board_checks_size() {
        let mut env = Env::new(EnvConfig::default()).unwrap();
        let board = HiddenBoard::from_mine_coords((3, 3), &[(0, 0)]).unwrap();

        assert_eq!(
            env.reset_with_board(board),
            Err(EnvError::InvalidDimensions { rows: 3, cols: 3 })
        );
    }

    #[test]
    fn action_mask_tracks_revealed_cells() {
        let mut env = env_with_board((3, 3), &[(0, 0), (2, 2)]);
        env.step(4).unwrap();

        let mask = env.episode().unwrap().action_mask();

        assert_eq!(mask.len(), 9);
        assert!(!mask[4]);
        assert_eq!(mask.iter().filter(|&&legal| legal).count(), 8);

        env.step(0).unwrap();
        assert!(env.episode().unwrap().action_mask().iter().all(|&legal| !legal));
    }
}
