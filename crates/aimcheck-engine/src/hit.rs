//! Hit resolution: decides whether an action affects an entity and applies
//! the consequences to the entity. Score and progress bookkeeping belongs to
//! the caller, which reads the returned [`HitOutcome`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use aimcheck_core::entity::{Entity, EntityId, EntityKind, EntityPool};

use crate::config::ScoringConfig;
use crate::scoring::hit_score;

/// Shot-to-centre distance below which a shot connects.
pub const DEFAULT_HIT_RADIUS: f32 = 60.0;

/// Result of resolving one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// The action connected. `destroyed` is true when the entity left the
    /// fresh state and counts toward the win condition; a bot that survives
    /// the damage is a hit that is not destroyed.
    Hit {
        id: EntityId,
        score_delta: u32,
        destroyed: bool,
    },
    /// Live entities exist but none was close enough.
    Miss,
    /// A tile was clicked out of order.
    WrongOrder { expected: u8, clicked: u8 },
    /// Nothing to resolve against: empty pool, unknown id, an entity already
    /// hit or removed, or an action that does not apply to the entity kind.
    Ignored,
}

impl HitOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, HitOutcome::Hit { .. })
    }

    pub fn score_delta(&self) -> u32 {
        match self {
            HitOutcome::Hit { score_delta, .. } => *score_delta,
            _ => 0,
        }
    }
}

/// Nearest fresh entity whose centre lies strictly within `radius` of
/// `origin`. Equal distances go to the lowest id.
pub fn nearest_within(pool: &EntityPool, origin: Vec2, radius: f32) -> Option<EntityId> {
    if !origin.is_finite() || !radius.is_finite() {
        return None;
    }
    let radius_sq = radius * radius;
    pool.live()
        .map(|e| (e.position.distance_squared(origin), e.id))
        .filter(|(d, _)| *d < radius_sq)
        .min_by(|(da, ia), (db, ib)| da.total_cmp(db).then(ia.cmp(ib)))
        .map(|(_, id)| id)
}

/// Resolve a shot under the proximity policy.
pub fn resolve_shot(
    pool: &mut EntityPool,
    origin: Vec2,
    hit_radius: f32,
    scoring: &ScoringConfig,
    damage: u32,
) -> HitOutcome {
    if pool.live_count() == 0 {
        return HitOutcome::Ignored;
    }
    let Some(id) = nearest_within(pool, origin, hit_radius) else {
        return HitOutcome::Miss;
    };
    match pool.get_mut(id) {
        Some(entity) => apply_hit(entity, scoring, damage),
        None => HitOutcome::Ignored,
    }
}

/// Resolve an ordered click. `expected` is the 1-indexed step the player is
/// on. A correct click marks the tile hit; a wrong one leaves it untouched.
pub fn resolve_click(
    pool: &mut EntityPool,
    id: EntityId,
    expected: u8,
    scoring: &ScoringConfig,
) -> HitOutcome {
    let Some(entity) = pool.get_mut(id) else {
        return HitOutcome::Ignored;
    };
    if !entity.is_alive() {
        return HitOutcome::Ignored;
    }
    let Some(clicked) = entity.number() else {
        return HitOutcome::Ignored;
    };
    if clicked != expected {
        return HitOutcome::WrongOrder { expected, clicked };
    }
    apply_hit(entity, scoring, 0)
}

/// Apply one successful hit to `entity`.
///
/// Targets and tiles go straight to `Hit`. Bots lose `damage` health and are
/// only marked hit (and earn the kill bonus) when health reaches zero.
pub fn apply_hit(entity: &mut Entity, scoring: &ScoringConfig, damage: u32) -> HitOutcome {
    let id = entity.id;
    let destroyed = match entity.kind {
        EntityKind::Target | EntityKind::Tile { .. } => {
            if !entity.mark_hit() {
                return HitOutcome::Ignored;
            }
            true
        },
        EntityKind::Bot => {
            if !entity.is_alive() {
                return HitOutcome::Ignored;
            }
            entity.apply_damage(damage)
        },
    };
    let killed_bot = destroyed && entity.kind == EntityKind::Bot;
    let score_delta = hit_score(scoring.hit_reward, killed_bot, scoring.kill_bonus);
    tracing::debug!(%id, score_delta, destroyed, health = entity.health, "Hit");
    HitOutcome::Hit {
        id,
        score_delta,
        destroyed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimcheck_core::entity::HitState;
    use aimcheck_core::test_helpers::still_target;

    fn pool_of(entities: &[Entity]) -> EntityPool {
        let mut pool = EntityPool::new();
        for e in entities {
            pool.insert(*e);
        }
        pool
    }

    fn scoring() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn shot_inside_radius_hits() {
        let mut pool = pool_of(&[still_target(1, 100.0, 100.0)]);
        let outcome = resolve_shot(&mut pool, Vec2::new(130.0, 100.0), 60.0, &scoring(), 0);
        assert_eq!(
            outcome,
            HitOutcome::Hit {
                id: EntityId(1),
                score_delta: 10,
                destroyed: true
            }
        );
        assert_eq!(pool.get(EntityId(1)).unwrap().hit_state, HitState::Hit);
    }

    #[test]
    fn distance_equal_to_radius_misses() {
        let mut pool = pool_of(&[still_target(1, 100.0, 100.0)]);
        let outcome = resolve_shot(&mut pool, Vec2::new(160.0, 100.0), 60.0, &scoring(), 0);
        assert_eq!(outcome, HitOutcome::Miss);
        assert!(pool.get(EntityId(1)).unwrap().is_alive());
    }

    #[test]
    fn nearest_entity_is_credited() {
        let mut pool = pool_of(&[
            still_target(1, 100.0, 100.0),
            still_target(2, 140.0, 100.0),
        ]);
        let outcome = resolve_shot(&mut pool, Vec2::new(130.0, 100.0), 60.0, &scoring(), 0);
        assert!(matches!(outcome, HitOutcome::Hit { id: EntityId(2), .. }));
        assert!(pool.get(EntityId(1)).unwrap().is_alive());
    }

    #[test]
    fn equidistant_tie_goes_to_lowest_id() {
        let mut pool = pool_of(&[
            still_target(7, 140.0, 100.0),
            still_target(3, 60.0, 100.0),
        ]);
        let outcome = resolve_shot(&mut pool, Vec2::new(100.0, 100.0), 60.0, &scoring(), 0);
        assert!(matches!(outcome, HitOutcome::Hit { id: EntityId(3), .. }));
    }

    #[test]
    fn hit_entities_are_not_candidates() {
        let mut pool = pool_of(&[still_target(1, 100.0, 100.0)]);
        resolve_shot(&mut pool, Vec2::new(100.0, 100.0), 60.0, &scoring(), 0);
        let again = resolve_shot(&mut pool, Vec2::new(100.0, 100.0), 60.0, &scoring(), 0);
        assert_eq!(again, HitOutcome::Ignored);
    }

    #[test]
    fn empty_pool_is_ignored() {
        let mut pool = EntityPool::new();
        let outcome = resolve_shot(&mut pool, Vec2::ZERO, 60.0, &scoring(), 0);
        assert_eq!(outcome, HitOutcome::Ignored);
    }

    #[test]
    fn bot_takes_damage_then_dies_with_bonus() {
        let bot = Entity::bot(EntityId(1), Vec2::new(50.0, 50.0), 0.0, 0.0, 0.0, 40, 45.0, 0);
        let mut pool = pool_of(&[bot]);
        let first = resolve_shot(&mut pool, Vec2::new(50.0, 50.0), 60.0, &scoring(), 20);
        assert_eq!(
            first,
            HitOutcome::Hit {
                id: EntityId(1),
                score_delta: 10,
                destroyed: false
            }
        );
        assert_eq!(pool.get(EntityId(1)).unwrap().health, 20);
        let second = resolve_shot(&mut pool, Vec2::new(50.0, 50.0), 60.0, &scoring(), 20);
        assert_eq!(
            second,
            HitOutcome::Hit {
                id: EntityId(1),
                score_delta: 60,
                destroyed: true
            }
        );
        assert_eq!(pool.get(EntityId(1)).unwrap().hit_state, HitState::Hit);
        let third = resolve_shot(&mut pool, Vec2::new(50.0, 50.0), 60.0, &scoring(), 20);
        assert_eq!(third, HitOutcome::Ignored);
    }

    fn tiles() -> EntityPool {
        pool_of(&[
            Entity::tile(EntityId(1), 1, Vec2::new(10.0, 10.0), 35.0, 0),
            Entity::tile(EntityId(2), 2, Vec2::new(90.0, 10.0), 35.0, 0),
            Entity::tile(EntityId(3), 3, Vec2::new(170.0, 10.0), 35.0, 0),
        ])
    }

    #[test]
    fn click_in_order_hits() {
        let mut pool = tiles();
        let outcome = resolve_click(&mut pool, EntityId(1), 1, &scoring());
        assert!(outcome.is_hit());
        assert_eq!(outcome.score_delta(), 10);
    }

    #[test]
    fn click_out_of_order_is_wrong_order() {
        let mut pool = tiles();
        let outcome = resolve_click(&mut pool, EntityId(3), 2, &scoring());
        assert_eq!(
            outcome,
            HitOutcome::WrongOrder {
                expected: 2,
                clicked: 3
            }
        );
        assert!(pool.get(EntityId(3)).unwrap().is_alive());
    }

    #[test]
    fn click_on_unknown_or_spent_tile_is_ignored() {
        let mut pool = tiles();
        assert_eq!(
            resolve_click(&mut pool, EntityId(99), 1, &scoring()),
            HitOutcome::Ignored
        );
        resolve_click(&mut pool, EntityId(1), 1, &scoring());
        assert_eq!(
            resolve_click(&mut pool, EntityId(1), 2, &scoring()),
            HitOutcome::Ignored
        );
    }

    #[test]
    fn click_on_non_tile_is_ignored() {
        let mut pool = pool_of(&[still_target(1, 0.0, 0.0)]);
        assert_eq!(
            resolve_click(&mut pool, EntityId(1), 1, &scoring()),
            HitOutcome::Ignored
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn credited_entity_is_strictly_within_radius(
                positions in proptest::collection::vec((0.0f32..400.0, 0.0f32..400.0), 1..6),
                shot in (0.0f32..400.0, 0.0f32..400.0),
            ) {
                let entities: Vec<Entity> = positions
                    .iter()
                    .enumerate()
                    .map(|(i, (x, y))| still_target(i as u32 + 1, *x, *y))
                    .collect();
                let mut pool = pool_of(&entities);
                let origin = Vec2::new(shot.0, shot.1);
                let outcome = resolve_shot(&mut pool, origin, DEFAULT_HIT_RADIUS, &scoring(), 0);
                if let HitOutcome::Hit { id, .. } = outcome {
                    let hit = pool.get(id).unwrap();
                    let d = hit.position.distance(origin);
                    prop_assert!(d < DEFAULT_HIT_RADIUS + 1e-3);
                    for other in pool.live() {
                        prop_assert!(other.position.distance(origin) >= d - 1e-3);
                    }
                } else {
                    prop_assert_eq!(outcome, HitOutcome::Miss);
                    prop_assert_eq!(pool.live_count(), entities.len());
                }
            }
        }
    }
}
