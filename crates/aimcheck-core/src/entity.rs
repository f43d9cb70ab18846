use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Session-local entity identifier. Ids restart at 1 for every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an entity with respect to hit resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitState {
    #[default]
    Fresh,
    Hit,
    Removed,
}

/// What an entity is, which decides how it is resolved and scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Gallery target: one hit takes it down.
    Target,
    /// Bot with a health pool; destroyed when health reaches zero.
    Bot,
    /// Numbered tile for the ordered-click challenge (1-indexed).
    Tile { number: u8 },
}

/// Velocity update rule applied by kinematics before each integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Constant velocity between wall reflections.
    Linear,
    /// Heading advances by `angular_rate` rad/s; velocity follows the heading
    /// at constant `speed`.
    Circling { angular_rate: f32, speed: f32 },
    Static,
}

/// A movable target or bot participating in hit resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub motion: Motion,
    /// Centre of the entity.
    pub position: Vec2,
    /// Units per second.
    pub velocity: Vec2,
    /// Heading in radians; only meaningful for circling motion.
    pub heading: f32,
    pub radius: f32,
    pub hit_state: HitState,
    pub health: u32,
    /// Logical time (ms) of creation.
    pub spawned_at: u64,
}

impl Entity {
    pub fn target(id: EntityId, position: Vec2, velocity: Vec2, radius: f32, now: u64) -> Self {
        Self {
            id,
            kind: EntityKind::Target,
            motion: Motion::Linear,
            position,
            velocity,
            heading: velocity.y.atan2(velocity.x),
            radius,
            hit_state: HitState::Fresh,
            health: 0,
            spawned_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bot(
        id: EntityId,
        position: Vec2,
        heading: f32,
        speed: f32,
        angular_rate: f32,
        health: u32,
        radius: f32,
        now: u64,
    ) -> Self {
        Self {
            id,
            kind: EntityKind::Bot,
            motion: Motion::Circling {
                angular_rate,
                speed,
            },
            position,
            velocity: Vec2::from_angle(heading) * speed,
            heading,
            radius,
            hit_state: HitState::Fresh,
            health,
            spawned_at: now,
        }
    }

    pub fn tile(id: EntityId, number: u8, position: Vec2, radius: f32, now: u64) -> Self {
        Self {
            id,
            kind: EntityKind::Tile { number },
            motion: Motion::Static,
            position,
            velocity: Vec2::ZERO,
            heading: 0.0,
            radius,
            hit_state: HitState::Fresh,
            health: 0,
            spawned_at: now,
        }
    }

    /// Still eligible for hit resolution.
    pub fn is_alive(&self) -> bool {
        self.hit_state == HitState::Fresh
    }

    pub fn number(&self) -> Option<u8> {
        match self.kind {
            EntityKind::Tile { number } => Some(number),
            _ => None,
        }
    }

    /// Fresh -> Hit. Returns false if the entity was not fresh.
    pub fn mark_hit(&mut self) -> bool {
        if self.hit_state != HitState::Fresh {
            return false;
        }
        self.hit_state = HitState::Hit;
        true
    }

    /// Subtract `damage` from health. Returns true when this call brought the
    /// entity down; a dead entity is marked hit and never revives.
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = self.health.saturating_sub(damage);
        if self.health == 0 {
            self.hit_state = HitState::Hit;
            return true;
        }
        false
    }
}

/// Flat arena of live entities, indexed by id.
///
/// Removed entities leave the pool immediately, so `len()` is the number of
/// entities currently on screen (fresh or awaiting removal after a hit).
#[derive(Debug, Clone, Default)]
pub struct EntityPool {
    entities: Vec<Entity>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities still eligible for hit resolution.
    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_alive()).count()
    }

    pub fn insert(&mut self, entity: Entity) {
        debug_assert!(self.get(entity.id).is_none(), "duplicate entity id");
        self.entities.push(entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Take an entity out of the pool, marking the returned copy `Removed`.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        let mut entity = self.entities.swap_remove(idx);
        entity.hit_state = HitState::Removed;
        Some(entity)
    }

    /// Remove everything, returning the ids that were present (ascending).
    pub fn clear(&mut self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.drain(..).map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn live(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: u32) -> Entity {
        Entity::target(EntityId(id), Vec2::ZERO, Vec2::X, 40.0, 0)
    }

    #[test]
    fn mark_hit_only_once() {
        let mut e = target(1);
        assert!(e.mark_hit());
        assert!(!e.mark_hit());
        assert_eq!(e.hit_state, HitState::Hit);
    }

    #[test]
    fn damage_kills_at_zero() {
        let mut bot = Entity::bot(EntityId(1), Vec2::ZERO, 0.0, 100.0, 1.0, 30, 40.0, 0);
        assert!(!bot.apply_damage(20));
        assert_eq!(bot.health, 10);
        assert!(bot.is_alive());
        assert!(bot.apply_damage(20));
        assert_eq!(bot.health, 0);
        assert!(!bot.is_alive());
        // Already dead: no further effect
        assert!(!bot.apply_damage(20));
    }

    #[test]
    fn bot_velocity_follows_heading() {
        let bot = Entity::bot(
            EntityId(1),
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_2,
            50.0,
            1.0,
            100,
            40.0,
            0,
        );
        assert!(bot.velocity.x.abs() < 1e-4);
        assert!((bot.velocity.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn pool_remove_marks_removed() {
        let mut pool = EntityPool::new();
        pool.insert(target(1));
        pool.insert(target(2));
        let removed = pool.remove(EntityId(1)).unwrap();
        assert_eq!(removed.hit_state, HitState::Removed);
        assert_eq!(pool.len(), 1);
        assert!(pool.get(EntityId(1)).is_none());
        assert!(pool.remove(EntityId(1)).is_none());
    }

    #[test]
    fn pool_clear_returns_sorted_ids() {
        let mut pool = EntityPool::new();
        pool.insert(target(3));
        pool.insert(target(1));
        pool.insert(target(2));
        assert_eq!(pool.clear(), vec![EntityId(1), EntityId(2), EntityId(3)]);
        assert!(pool.is_empty());
    }

    #[test]
    fn live_count_ignores_hit_entities() {
        let mut pool = EntityPool::new();
        pool.insert(target(1));
        pool.insert(target(2));
        pool.get_mut(EntityId(1)).unwrap().mark_hit();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.live_count(), 1);
    }

    #[test]
    fn tile_number() {
        let t = Entity::tile(EntityId(4), 3, Vec2::ZERO, 30.0, 0);
        assert_eq!(t.number(), Some(3));
        assert_eq!(target(1).number(), None);
    }
}
