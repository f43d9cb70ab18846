use aimcheck_core::entity::{Entity, EntityId};
use aimcheck_core::input::PointerEvent;
use aimcheck_core::render::RenderCommand;

use aimcheck_engine::{Challenge, ChallengeBuilder, ChallengeConfig, ChallengeKind, HitOutcome};

/// A challenge that records every render notification.
pub type Recorded = Challenge<Vec<RenderCommand>>;

/// Frame length used when stepping a challenge, in logical ms.
pub const FRAME_MS: u64 = 50;

pub fn recording(kind: ChallengeKind, seed: u64) -> Recorded {
    recording_with(ChallengeConfig::for_kind(kind), seed)
}

pub fn recording_with(config: ChallengeConfig, seed: u64) -> Recorded {
    ChallengeBuilder::new(config)
        .seed(seed)
        .renderer(Vec::new())
        .build()
        .unwrap()
}

/// Step from the current time up to `until_ms` in `FRAME_MS` frames.
pub fn run_until(challenge: &mut Recorded, until_ms: u64) {
    let mut now = challenge.now_ms();
    while now < until_ms {
        now = (now + FRAME_MS).min(until_ms);
        challenge.advance(now);
    }
}

/// Lowest-id entity still eligible for hit resolution.
pub fn first_live(challenge: &Recorded) -> Option<Entity> {
    challenge
        .current_state()
        .entities
        .into_iter()
        .find(|e| e.is_alive())
}

/// Shoot dead centre at the lowest-id live entity, if any.
pub fn shoot_first_live(challenge: &mut Recorded) -> Option<HitOutcome> {
    let target = first_live(challenge)?;
    Some(challenge.handle_pointer(&PointerEvent::at(target.position.x, target.position.y)))
}

/// Id of the tile carrying `number`.
pub fn tile_id(challenge: &Recorded, number: u8) -> EntityId {
    challenge
        .current_state()
        .entities
        .iter()
        .find(|e| e.number() == Some(number))
        .map(|e| e.id)
        .unwrap()
}

/// Click the tile carrying `number` the way a host hit-test would report it.
pub fn click_number(challenge: &mut Recorded, number: u8) -> HitOutcome {
    let id = tile_id(challenge, number);
    let tile = challenge
        .current_state()
        .entities
        .into_iter()
        .find(|e| e.id == id)
        .unwrap();
    challenge.handle_pointer(&PointerEvent::on(id, tile.position.x, tile.position.y))
}

/// Play a gallery challenge until it ends, shooting whenever something is
/// live. Gives up at `limit_ms`.
pub fn play_gallery(challenge: &mut Recorded, limit_ms: u64) {
    let mut now = challenge.now_ms();
    while challenge.status() == aimcheck_core::outcome::ChallengeStatus::Active && now < limit_ms {
        shoot_first_live(challenge);
        now += FRAME_MS;
        challenge.advance(now);
    }
}
