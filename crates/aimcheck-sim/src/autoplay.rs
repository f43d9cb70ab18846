//! Scripted player that drives a challenge on a logical clock.

use std::collections::HashSet;

use anyhow::Result;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use aimcheck_core::input::{InputAction, KeyEvent, PointerEvent};
use aimcheck_core::outcome::ChallengeStatus;
use aimcheck_engine::{Challenge, ChallengeBuilder, ChallengeConfig, ChallengeKind, HitOutcome};

/// Distance at which the crosshair counts as on the bot.
const AIM_TOLERANCE: f32 = 20.0;
/// Where a deliberately wild shot lands: far outside any playfield.
const WILD_SHOT: Vec2 = Vec2::new(-1000.0, -1000.0);

/// Autoplayer tuning.
#[derive(Debug, Clone, Copy)]
pub struct PlayStyle {
    /// Probability that an attempted action is the right one.
    pub accuracy: f64,
    pub frame_ms: u64,
    /// Minimum time between actions.
    pub reaction_ms: u64,
}

/// Outcome of one autoplayed challenge.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: u32,
    pub seed: u64,
    pub kind: ChallengeKind,
    pub status: ChallengeStatus,
    pub score: u32,
    pub time_remaining: Option<u32>,
    pub token: Option<String>,
    pub actions: u32,
    pub hits: u32,
    pub elapsed_ms: u64,
}

struct Autoplayer {
    rng: StdRng,
    style: PlayStyle,
    held: HashSet<&'static str>,
    actions: u32,
    hits: u32,
}

/// Play one challenge to completion (or until the clock would certainly have
/// run out) and summarise it.
pub fn play(config: &ChallengeConfig, run: u32, seed: u64, style: PlayStyle) -> Result<RunSummary> {
    let mut challenge = ChallengeBuilder::new(config.clone()).seed(seed).build()?;
    let mut player = Autoplayer {
        rng: StdRng::seed_from_u64(seed.rotate_left(17)),
        style,
        held: HashSet::new(),
        actions: 0,
        hits: 0,
    };
    let limit_ms = u64::from(config.duration_secs) * 1000 + config.clock_tick_ms;
    let frame_ms = style.frame_ms.max(1);

    challenge.start();
    let mut now = 0;
    let mut next_action = style.reaction_ms;
    while challenge.status() == ChallengeStatus::Active && now < limit_ms {
        now += frame_ms;
        challenge.advance(now);
        if challenge.status() != ChallengeStatus::Active {
            break;
        }
        if config.kind == ChallengeKind::Bot {
            player.steer(&mut challenge);
        }
        if now >= next_action {
            next_action = now + style.reaction_ms;
            player.act(&mut challenge);
        }
    }

    let state = challenge.current_state();
    let result = challenge.result();
    tracing::debug!(run, seed, status = ?state.status, actions = player.actions, "Run finished");
    Ok(RunSummary {
        run,
        seed,
        kind: config.kind,
        status: state.status,
        score: state.score,
        time_remaining: result.map(|r| r.time_remaining),
        token: result.map(|r| r.token.value().to_string()),
        actions: player.actions,
        hits: player.hits,
        elapsed_ms: now,
    })
}

impl Autoplayer {
    fn on_target(&mut self) -> bool {
        self.rng.random_bool(self.style.accuracy)
    }

    fn record(&mut self, outcome: HitOutcome) {
        self.actions += 1;
        if outcome.is_hit() {
            self.hits += 1;
        }
    }

    fn act(&mut self, challenge: &mut Challenge) {
        let state = challenge.current_state();
        if state.input_locked {
            return;
        }
        match state.kind {
            ChallengeKind::Gallery => {
                let Some(target) = state.entities.iter().find(|e| e.is_alive()) else {
                    return;
                };
                let aim = if self.on_target() {
                    target.position
                } else {
                    WILD_SHOT
                };
                let outcome = challenge.handle_pointer(&PointerEvent::at(aim.x, aim.y));
                self.record(outcome);
            },
            ChallengeKind::Bot => {
                let Some(bot) = state.entities.iter().find(|e| e.is_alive()) else {
                    return;
                };
                if bot.position.distance(state.player) > AIM_TOLERANCE {
                    return;
                }
                let outcome = if self.on_target() {
                    let outcome = challenge.handle_key(&KeyEvent::down("Space"));
                    challenge.handle_key(&KeyEvent::up("Space"));
                    outcome
                } else {
                    challenge.apply_action(InputAction::Shoot(WILD_SHOT))
                };
                self.record(outcome);
            },
            ChallengeKind::Sequence => {
                let Some(expected) = state.next_step else {
                    return;
                };
                let live: Vec<_> = state.entities.iter().filter(|e| e.is_alive()).collect();
                let wrong: Vec<_> = live
                    .iter()
                    .filter(|e| e.number() != Some(expected))
                    .collect();
                let pick = if self.on_target() || wrong.is_empty() {
                    live.iter().find(|e| e.number() == Some(expected))
                } else {
                    wrong.get(self.rng.random_range(0..wrong.len())).copied()
                };
                let Some(tile) = pick else {
                    return;
                };
                let outcome = challenge.handle_pointer(&PointerEvent::on(
                    tile.id,
                    tile.position.x,
                    tile.position.y,
                ));
                self.record(outcome);
            },
        }
    }

    /// Hold the movement keys that bring the crosshair toward the bot.
    fn steer(&mut self, challenge: &mut Challenge) {
        let state = challenge.current_state();
        let Some(bot) = state.entities.iter().find(|e| e.is_alive()) else {
            return;
        };
        let delta = bot.position - state.player;
        let wanted = [
            ("ArrowRight", delta.x > AIM_TOLERANCE / 2.0),
            ("ArrowLeft", delta.x < -AIM_TOLERANCE / 2.0),
            ("ArrowDown", delta.y > AIM_TOLERANCE / 2.0),
            ("ArrowUp", delta.y < -AIM_TOLERANCE / 2.0),
        ];
        for (code, hold) in wanted {
            if hold && self.held.insert(code) {
                challenge.handle_key(&KeyEvent::down(code));
            } else if !hold && self.held.remove(code) {
                challenge.handle_key(&KeyEvent::up(code));
            }
        }
    }
}
