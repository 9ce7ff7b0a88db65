//! Game session state machine
//!
//! ```text
//! Playing --tap target--> Playing (next stage)
//! Playing --tap other---> Playing (message only)
//! Playing --countdown 0-> Revealing --reveal delay--> AwaitingDecision
//! AwaitingDecision --Retry--> Playing (stage 1)
//! AwaitingDecision --Exit---> Terminated
//! ```
//!
//! All session state lives in one owned `GameSession`. Hosts feed it taps,
//! decisions and wall-clock time, then drain the `GameEvent`s it produced.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Canvas, Grid, generate_fitting_grid};
use super::stage::StageState;
use super::timer::{Countdown, CountdownStep, Scheduler, Timer, TimerKind};
use crate::consts::*;
use crate::error::LayoutError;
use crate::ranking::{Identity, RankingEntry};
use crate::settings::Settings;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Countdown running, taps accepted
    Playing,
    /// Time ran out; target highlighted, waiting out the reveal delay
    Revealing,
    /// Retry/exit prompt is up
    AwaitingDecision,
    /// Player chose to exit
    Terminated,
}

/// Player's answer to the retry/exit prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Retry,
    Exit,
}

/// Screens the host can be asked to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    StartScreen,
    Ranking,
}

/// What a tap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Correct,
    Incorrect,
    /// Not clickable right now, or outside the grid
    Ignored,
}

/// Outbound notifications for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A fresh grid is up and the countdown restarted
    StageStarted {
        stage: u32,
        grid_size: u32,
        tile_size: u32,
    },
    CountdownTick {
        remaining: u32,
    },
    /// Ephemeral inline message
    Message {
        text: String,
    },
    /// Time ran out; draw the grid revealed
    Revealed {
        target: u32,
    },
    /// Show the retry/exit prompt
    DecisionRequested,
    /// Best-effort ranking write; the session never waits for it
    SubmitScore {
        entry: RankingEntry,
    },
    Navigate {
        to: Navigation,
    },
}

/// Renderer-facing view of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub stage: u32,
    pub grid_size: u32,
    pub tile_size: u32,
    pub spacing: u32,
    pub remaining_secs: u32,
    pub clickable: bool,
    /// `#rrggbb` per cell, row-major, reveal applied
    pub colors: Vec<String>,
}

/// One player's run of stages
#[derive(Debug, Clone)]
pub struct GameSession {
    settings: Settings,
    canvas: Canvas,
    identity: Option<Identity>,
    rng: Pcg32,
    stage: StageState,
    grid: Grid,
    phase: GamePhase,
    countdown: Countdown,
    scheduler: Scheduler,
    reveal_generation: u64,
    now_ms: u64,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Start at stage 1 with the countdown running from `now_ms = 0`.
    ///
    /// Fails only when the canvas cannot fit even the smallest grid.
    pub fn new(settings: &Settings, canvas: Canvas, seed: u64) -> Result<Self, LayoutError> {
        let settings = settings.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let stage = StageState::new(settings.initial_grid_size);
        let grid = generate_fitting_grid(
            &mut rng,
            stage.grid_size,
            canvas,
            settings.tile_spacing,
            settings.color_shift,
        )?;

        let mut session = Self {
            countdown: Countdown::new(settings.time_limit_secs),
            settings,
            canvas,
            identity: None,
            rng,
            stage,
            grid,
            phase: GamePhase::Playing,
            scheduler: Scheduler::new(),
            reveal_generation: 0,
            now_ms: 0,
            events: Vec::new(),
        };
        log::info!("Session started with seed {}", seed);
        session.begin_stage();
        Ok(session)
    }

    /// Attach the signed-in player; anonymous sessions never submit scores
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn stage(&self) -> &StageState {
        &self.stage
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// When the host should next call `advance_to`
    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Taps are only accepted while playing
    pub fn is_clickable(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_revealed(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Revealing | GamePhase::AwaitingDecision
        )
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            stage: self.stage.stage,
            grid_size: self.grid.size(),
            tile_size: self.grid.tile_size(),
            spacing: self.grid.spacing(),
            remaining_secs: self.countdown.remaining(),
            clickable: self.is_clickable(),
            colors: self
                .grid
                .display_colors(self.is_revealed())
                .into_iter()
                .map(|c| c.to_hex())
                .collect(),
        }
    }

    /// Handle a tap on the tile at `index` (row-major)
    pub fn tap(&mut self, index: u32) -> TapOutcome {
        if !self.is_clickable() {
            log::debug!("Tap on {} ignored while {:?}", index, self.phase);
            return TapOutcome::Ignored;
        }

        let Some(cell) = self.grid.cell(index) else {
            log::warn!("Tap on {} outside {} cells", index, self.grid.cell_count());
            return TapOutcome::Ignored;
        };

        if cell.is_target {
            self.countdown.cancel(&mut self.scheduler);
            self.stage.advance_stage();
            self.begin_stage();
            TapOutcome::Correct
        } else {
            self.events.push(GameEvent::Message {
                text: TRY_AGAIN_MESSAGE.to_string(),
            });
            TapOutcome::Incorrect
        }
    }

    /// Answer the retry/exit prompt. Returns false if no prompt is up.
    pub fn choose(&mut self, decision: Decision) -> bool {
        if self.phase != GamePhase::AwaitingDecision {
            log::debug!("{:?} ignored while {:?}", decision, self.phase);
            return false;
        }

        log::info!("{:?} chosen at stage {}", decision, self.stage.stage);
        match decision {
            Decision::Retry => {
                self.stage.reset_to_initial();
                self.phase = GamePhase::Playing;
                self.begin_stage();
            }
            Decision::Exit => {
                if let Some(identity) = &self.identity {
                    self.events.push(GameEvent::SubmitScore {
                        entry: RankingEntry::new(identity, self.stage.stage),
                    });
                }
                self.events.push(GameEvent::Navigate {
                    to: Navigation::StartScreen,
                });
                self.scheduler.clear();
                self.phase = GamePhase::Terminated;
            }
        }
        true
    }

    /// Move the clock forward, firing every timer that came due in order
    pub fn advance_to(&mut self, now_ms: u64) {
        if now_ms < self.now_ms {
            log::warn!("Clock went backwards ({} < {})", now_ms, self.now_ms);
            return;
        }

        while let Some(timer) = self.scheduler.pop_due(now_ms) {
            self.now_ms = timer.due_ms;
            self.fire(timer);
        }
        self.now_ms = now_ms;
    }

    pub fn advance_by(&mut self, dt_ms: u64) {
        self.advance_to(self.now_ms + dt_ms);
    }

    fn fire(&mut self, timer: Timer) {
        match timer.kind {
            TimerKind::CountdownTick => {
                match self.countdown.on_tick(&timer, &mut self.scheduler) {
                    CountdownStep::Ticked(remaining) => {
                        self.events.push(GameEvent::CountdownTick { remaining });
                    }
                    CountdownStep::Expired => {
                        self.events.push(GameEvent::CountdownTick { remaining: 0 });
                        self.on_time_up();
                    }
                    CountdownStep::Stale => {}
                }
            }
            TimerKind::RevealElapsed => {
                let current = timer.generation == self.reveal_generation;
                if self.phase == GamePhase::Revealing && current {
                    self.phase = GamePhase::AwaitingDecision;
                    self.events.push(GameEvent::DecisionRequested);
                }
            }
        }
    }

    fn on_time_up(&mut self) {
        log::info!(
            "Time up at stage {} (target was {})",
            self.stage.stage,
            self.grid.target_index()
        );
        self.phase = GamePhase::Revealing;
        self.events.push(GameEvent::Revealed {
            target: self.grid.target_index(),
        });

        self.reveal_generation += 1;
        self.scheduler.schedule(Timer {
            due_ms: self.now_ms + self.settings.reveal_delay_ms,
            kind: TimerKind::RevealElapsed,
            generation: self.reveal_generation,
        });
    }

    /// Fresh grid for the current stage and a fresh countdown
    fn begin_stage(&mut self) {
        match generate_fitting_grid(
            &mut self.rng,
            self.stage.grid_size,
            self.canvas,
            self.settings.tile_spacing,
            self.settings.color_shift,
        ) {
            Ok(grid) => self.grid = grid,
            Err(e) => log::error!("Keeping previous grid: {}", e),
        }

        self.countdown.start(self.now_ms, &mut self.scheduler);
        log::info!(
            "Stage {}: {}x{} grid, {}px tiles",
            self.stage.stage,
            self.grid.size(),
            self.grid.size(),
            self.grid.tile_size()
        );
        self.events.push(GameEvent::StageStarted {
            stage: self.stage.stage,
            grid_size: self.grid.size(),
            tile_size: self.grid.tile_size(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::color::Rgb;

    fn session() -> GameSession {
        GameSession::new(&Settings::default(), Canvas::square(1080), 12345).unwrap()
    }

    fn wrong_tile(session: &GameSession) -> u32 {
        (session.grid().target_index() + 1) % session.grid().cell_count()
    }

    fn time_out(session: &mut GameSession) {
        let until = session.now_ms() + u64::from(TIME_LIMIT_SECS) * TICK_MS;
        session.advance_to(until);
    }

    #[test]
    fn test_new_session_starts_playing() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.stage().stage, 1);
        assert_eq!(s.grid().size(), INITIAL_GRID_SIZE);
        assert_eq!(s.remaining_secs(), TIME_LIMIT_SECS);
        assert_eq!(s.next_due_ms(), Some(TICK_MS));
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::StageStarted {
                stage: 1,
                grid_size: 4,
                tile_size: 260
            }]
        );
    }

    #[test]
    fn test_correct_tap_advances_stage() {
        let mut s = session();
        s.advance_to(4_000);
        assert_eq!(s.remaining_secs(), 11);
        s.drain_events();

        let target = s.grid().target_index();
        assert_eq!(s.tap(target), TapOutcome::Correct);
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.stage().stage, 2);
        assert_eq!(s.grid().size(), 5);
        assert_eq!(s.remaining_secs(), TIME_LIMIT_SECS);
        assert_eq!(s.next_due_ms(), Some(5_000));
        assert!(matches!(
            s.drain_events().as_slice(),
            [GameEvent::StageStarted { stage: 2, grid_size: 5, .. }]
        ));
    }

    #[test]
    fn test_wrong_tap_changes_nothing() {
        let mut s = session();
        s.advance_to(2_500);
        s.drain_events();
        let before = s.snapshot();
        let next_due = s.next_due_ms();

        assert_eq!(s.tap(wrong_tile(&s)), TapOutcome::Incorrect);
        assert_eq!(s.snapshot(), before);
        assert_eq!(s.next_due_ms(), next_due);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::Message {
                text: TRY_AGAIN_MESSAGE.to_string()
            }]
        );
    }

    #[test]
    fn test_out_of_range_tap_ignored() {
        let mut s = session();
        assert_eq!(s.tap(16), TapOutcome::Ignored);
        assert_eq!(s.tap(u32::MAX), TapOutcome::Ignored);
        assert_eq!(s.stage().stage, 1);
    }

    #[test]
    fn test_timeout_reveal_then_prompt() {
        let mut s = session();
        s.drain_events();
        time_out(&mut s);

        assert_eq!(s.phase(), GamePhase::Revealing);
        assert_eq!(s.remaining_secs(), 0);
        let events = s.drain_events();
        assert_eq!(events.len(), TIME_LIMIT_SECS as usize + 1);
        assert_eq!(
            events.last(),
            Some(&GameEvent::Revealed {
                target: s.grid().target_index()
            })
        );

        let snap = s.snapshot();
        assert!(!snap.clickable);
        let target = s.grid().target_index() as usize;
        for (i, color) in snap.colors.iter().enumerate() {
            let expected = if i == target { Rgb::HIGHLIGHT } else { Rgb::DIM };
            assert_eq!(color, &expected.to_hex());
        }

        s.advance_by(REVEAL_DELAY_MS - 1);
        assert_eq!(s.phase(), GamePhase::Revealing);
        assert!(s.drain_events().is_empty());

        s.advance_by(1);
        assert_eq!(s.phase(), GamePhase::AwaitingDecision);
        assert_eq!(s.drain_events(), vec![GameEvent::DecisionRequested]);
    }

    #[test]
    fn test_taps_ignored_after_timeout() {
        let mut s = session();
        time_out(&mut s);
        let target = s.grid().target_index();
        assert_eq!(s.tap(target), TapOutcome::Ignored);

        s.advance_by(REVEAL_DELAY_MS);
        assert_eq!(s.tap(target), TapOutcome::Ignored);
        assert_eq!(s.stage().stage, 1);
        assert_eq!(s.phase(), GamePhase::AwaitingDecision);
    }

    #[test]
    fn test_retry_resets_to_stage_one() {
        let mut s = session();
        for _ in 0..3 {
            let target = s.grid().target_index();
            s.tap(target);
        }
        assert_eq!(s.stage().stage, 4);

        time_out(&mut s);
        assert!(!s.choose(Decision::Retry));
        s.advance_by(REVEAL_DELAY_MS);
        s.drain_events();

        assert!(s.choose(Decision::Retry));
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.stage().stage, 1);
        assert_eq!(s.grid().size(), INITIAL_GRID_SIZE);
        assert_eq!(s.remaining_secs(), TIME_LIMIT_SECS);
        assert!(matches!(
            s.drain_events().as_slice(),
            [GameEvent::StageStarted { stage: 1, .. }]
        ));
    }

    #[test]
    fn test_exit_submits_score_for_signed_in_player() {
        let mut s = session().with_identity(Identity::new("uid-1", "Mina"));
        let target = s.grid().target_index();
        s.tap(target);
        time_out(&mut s);
        s.advance_by(REVEAL_DELAY_MS);
        s.drain_events();

        assert!(s.choose(Decision::Exit));
        assert_eq!(s.phase(), GamePhase::Terminated);
        assert_eq!(s.next_due_ms(), None);
        assert_eq!(
            s.drain_events(),
            vec![
                GameEvent::SubmitScore {
                    entry: RankingEntry {
                        key: "uid-1".to_string(),
                        score: 2,
                        name: "Mina".to_string(),
                    }
                },
                GameEvent::Navigate {
                    to: Navigation::StartScreen
                },
            ]
        );
        assert!(!s.choose(Decision::Retry));
    }

    #[test]
    fn test_exit_anonymous_only_navigates() {
        let mut s = session();
        time_out(&mut s);
        s.advance_by(REVEAL_DELAY_MS);
        s.drain_events();
        s.choose(Decision::Exit);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::Navigate {
                to: Navigation::StartScreen
            }]
        );
    }

    #[test]
    fn test_success_restarts_countdown_once() {
        let mut s = session();
        s.advance_to(10_000);
        let target = s.grid().target_index();
        s.tap(target);
        s.drain_events();

        // The first countdown would have expired at 15s
        s.advance_to(24_999);
        assert_eq!(s.phase(), GamePhase::Playing);
        assert_eq!(s.remaining_secs(), 1);

        s.advance_to(60_000);
        let revealed = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Revealed { .. }))
            .count();
        assert_eq!(revealed, 1);
        assert_eq!(s.phase(), GamePhase::AwaitingDecision);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut s = session();
        s.advance_to(5_000);
        s.advance_to(1_000);
        assert_eq!(s.now_ms(), 5_000);
        assert_eq!(s.remaining_secs(), 10);
    }

    #[test]
    fn test_same_seed_same_targets() {
        let mut a = session();
        let mut b = session();
        for _ in 0..5 {
            assert_eq!(a.grid(), b.grid());
            let target = a.grid().target_index();
            a.tap(target);
            b.tap(target);
        }
    }

    #[test]
    fn test_canvas_too_small() {
        let result = GameSession::new(&Settings::default(), Canvas::square(16), 1);
        assert!(matches!(result, Err(LayoutError::Degenerate { .. })));
    }

    #[test]
    fn test_grid_shrinks_on_small_canvas() {
        // 8px gaps: a 9x9 grid needs 80px of gaps, a 10x10 grid 88px
        let mut s = GameSession::new(&Settings::default(), Canvas::square(90), 5).unwrap();
        for _ in 0..10 {
            let target = s.grid().target_index();
            s.tap(target);
        }
        assert_eq!(s.stage().stage, 11);
        assert_eq!(s.stage().grid_size, 14);
        assert_eq!(s.grid().size(), 9);
        assert!(s.grid().tile_size() > 0);
    }

    #[test]
    fn test_oversized_initial_grid_is_capped() {
        let settings = Settings {
            initial_grid_size: 200_000_000,
            ..Settings::default()
        };
        let mut s = GameSession::new(&settings, Canvas::square(1080), 8).unwrap();
        assert_eq!(s.stage().grid_size, MAX_GRID_SIZE);
        // (1080 - 8) / 9
        assert_eq!(s.grid().size(), 119);

        let target = s.grid().target_index();
        assert_eq!(s.tap(target), TapOutcome::Correct);
        assert_eq!(s.stage().grid_size, MAX_GRID_SIZE + 1);
        assert_eq!(s.grid().size(), 119);
    }
}
