//! Bot challenge: circling bot with health, crosshair steering, fire key.

#[allow(dead_code)]
mod common;

use aimcheck_core::geometry::Viewport;
use aimcheck_core::input::KeyEvent;
use aimcheck_core::outcome::ChallengeStatus;
use aimcheck_core::render::RenderCommand;

use aimcheck_engine::{ChallengeBuilder, ChallengeConfig, ChallengeKind, HitOutcome};

use common::{FRAME_MS, Recorded, first_live, recording, shoot_first_live};

/// Bot and crosshair both pinned to the centre of a tiny arena.
fn pinned_bot() -> Recorded {
    let mut config = ChallengeConfig::bot();
    config.bot.speed = 0.0;
    config.bot.angular_rate = 0.0;
    ChallengeBuilder::new(config)
        .viewport(Viewport::new(200.0, 200.0))
        .seed(9)
        .renderer(Vec::new())
        .build()
        .unwrap()
}

#[test]
fn five_hits_destroy_the_bot() {
    let mut c = recording(ChallengeKind::Bot, 1);
    c.start();
    let mut now = 0;
    for shot in 1..=5 {
        now += FRAME_MS;
        c.advance(now);
        let outcome = shoot_first_live(&mut c).unwrap();
        let HitOutcome::Hit { destroyed, .. } = outcome else {
            panic!("shot {shot} missed: {outcome:?}");
        };
        assert_eq!(destroyed, shot == 5);
    }
    assert_eq!(c.status(), ChallengeStatus::Won);
    // Four plain hits plus the killing blow with its bonus
    assert_eq!(c.result().unwrap().score, 4 * 10 + 60);
}

#[test]
fn bot_health_drops_per_hit() {
    let mut c = recording(ChallengeKind::Bot, 2);
    c.start();
    shoot_first_live(&mut c);
    shoot_first_live(&mut c);
    assert_eq!(first_live(&c).unwrap().health, 60);
    assert_eq!(c.current_state().targets_hit, 0);
}

#[test]
fn bot_circles_inside_bounds() {
    let mut c = recording(ChallengeKind::Bot, 3);
    c.start();
    let bounds = *c.bounds();
    let start = first_live(&c).unwrap().position;
    let mut now = 0;
    while now < 20_000 {
        now += FRAME_MS;
        c.advance(now);
        let bot = first_live(&c).unwrap();
        assert!(bounds.contains(bot.position));
    }
    assert_ne!(first_live(&c).unwrap().position, start);
}

#[test]
fn fire_key_shoots_at_crosshair() {
    let mut c = pinned_bot();
    c.start();
    let outcome = c.handle_key(&KeyEvent::down("Space"));
    assert!(outcome.is_hit(), "{outcome:?}");
    assert_eq!(c.score(), 10);
    assert_eq!(c.handle_key(&KeyEvent::up("Space")), HitOutcome::Ignored);
}

#[test]
fn crosshair_reports_movement_and_stays_in_bounds() {
    let mut c = recording(ChallengeKind::Bot, 4);
    c.start();
    c.handle_key(&KeyEvent::down("KeyW"));
    c.handle_key(&KeyEvent::down("KeyA"));
    let mut now = 0;
    while now < 5_000 {
        now += FRAME_MS;
        c.advance(now);
    }
    let bounds = *c.bounds();
    assert_eq!(c.current_state().player, bounds.min);
    let moves = c
        .renderer()
        .iter()
        .filter(|cmd| matches!(cmd, RenderCommand::PlayerMoved { .. }))
        .count();
    assert!(moves > 1);
}

#[test]
fn click_order_does_not_apply_to_bot() {
    let mut c = recording(ChallengeKind::Bot, 5);
    c.start();
    let bot = first_live(&c).unwrap();
    let outcome = c.apply_action(aimcheck_core::input::InputAction::OrderClick(bot.id));
    assert_eq!(outcome, HitOutcome::Ignored);
}
