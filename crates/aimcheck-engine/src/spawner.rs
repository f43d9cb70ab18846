//! Spawner: keeps a bounded set of entities in the pool.
//!
//! The spawner decides *whether* and *what* to spawn; the challenge decides
//! *when* by scheduling spawn attempts. It never touches the render sink.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;

use aimcheck_core::entity::{Entity, EntityId, EntityPool};
use aimcheck_core::geometry::Bounds;

use crate::config::{ChallengeConfig, ChallengeKind, SpawnerConfig};

/// Attempts at finding a tile position clear of earlier tiles before
/// accepting an overlap.
const LAYOUT_ATTEMPTS: u32 = 32;

/// What a spawn produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityTemplate {
    /// Linear gallery target with a random direction and speed.
    Target,
    /// Circling bot with a random heading.
    Bot {
        health: u32,
        speed: f32,
        angular_rate: f32,
    },
    /// Static numbered tile, only placed through [`Spawner::spawn_round`].
    Tile,
}

impl EntityTemplate {
    pub fn for_config(config: &ChallengeConfig) -> Self {
        match config.kind {
            ChallengeKind::Gallery => EntityTemplate::Target,
            ChallengeKind::Bot => EntityTemplate::Bot {
                health: config.bot.health,
                speed: config.bot.speed,
                angular_rate: config.bot.angular_rate,
            },
            ChallengeKind::Sequence => EntityTemplate::Tile,
        }
    }
}

#[derive(Debug)]
pub struct Spawner {
    config: SpawnerConfig,
    template: EntityTemplate,
    rng: StdRng,
    next_id: u32,
    spawned_total: u32,
}

impl Spawner {
    pub fn new(config: &ChallengeConfig, rng: StdRng) -> Self {
        Self {
            config: config.spawner.clone(),
            template: EntityTemplate::for_config(config),
            rng,
            next_id: 1,
            spawned_total: 0,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Restart id allocation and the session total.
    pub fn reset(&mut self) {
        self.next_id = 1;
        self.spawned_total = 0;
    }

    /// Refill the session allowance for a restarted round. Ids keep counting
    /// so callbacks scheduled for the previous round never match a new entity.
    pub fn new_round(&mut self) {
        self.spawned_total = 0;
    }

    pub fn spawned_total(&self) -> u32 {
        self.spawned_total
    }

    /// The session spawn allowance is used up.
    pub fn exhausted(&self) -> bool {
        self.config.max_total > 0 && self.spawned_total >= self.config.max_total
    }

    /// Whether `pool` has room under the concurrency cap.
    pub fn has_room(&self, pool: &EntityPool) -> bool {
        pool.len() < self.config.max_concurrent
    }

    /// A removal left the pool under the low-water mark and a spawn could
    /// still succeed.
    pub fn needs_replenish(&self, pool: &EntityPool) -> bool {
        pool.len() < self.config.low_water && self.has_room(pool) && !self.exhausted()
    }

    /// Spawn one entity into `pool` if the cap and the session allowance
    /// permit. Returns a copy of the new entity.
    pub fn try_spawn(&mut self, pool: &mut EntityPool, bounds: &Bounds, now: u64) -> Option<Entity> {
        if !self.has_room(pool) || self.exhausted() {
            return None;
        }
        let entity = match self.template {
            EntityTemplate::Target => {
                let position = self.random_position(bounds);
                let velocity = Vec2::from_angle(self.rng.random_range(0.0..TAU)) * self.random_speed();
                Entity::target(self.alloc_id(), position, velocity, self.config.entity_radius, now)
            },
            EntityTemplate::Bot {
                health,
                speed,
                angular_rate,
            } => {
                let position = self.random_position(bounds);
                let heading = self.rng.random_range(0.0..TAU);
                Entity::bot(
                    self.alloc_id(),
                    position,
                    heading,
                    speed,
                    angular_rate,
                    health,
                    self.config.entity_radius,
                    now,
                )
            },
            EntityTemplate::Tile => return None,
        };
        pool.insert(entity);
        self.spawned_total += 1;
        tracing::debug!(
            id = %entity.id,
            x = entity.position.x,
            y = entity.position.y,
            total = self.spawned_total,
            "Spawned entity"
        );
        Some(entity)
    }

    /// Lay out tiles numbered `1..=length` at random positions, keeping them
    /// apart where space allows. Tiles beyond the concurrency cap are not
    /// placed.
    pub fn spawn_round(
        &mut self,
        pool: &mut EntityPool,
        bounds: &Bounds,
        length: u8,
        now: u64,
    ) -> Vec<Entity> {
        let radius = self.config.entity_radius;
        let min_gap_sq = (radius * 2.0) * (radius * 2.0);
        let mut placed = Vec::with_capacity(usize::from(length));
        for number in 1..=length {
            if !self.has_room(pool) {
                tracing::warn!(number, cap = self.config.max_concurrent, "Tile round exceeds pool cap");
                break;
            }
            let mut position = self.random_position(bounds);
            for _ in 0..LAYOUT_ATTEMPTS {
                let clear = pool
                    .iter()
                    .all(|e| e.position.distance_squared(position) >= min_gap_sq);
                if clear {
                    break;
                }
                position = self.random_position(bounds);
            }
            let tile = Entity::tile(self.alloc_id(), number, position, radius, now);
            pool.insert(tile);
            self.spawned_total += 1;
            placed.push(tile);
        }
        tracing::debug!(tiles = placed.len(), "Laid out tile round");
        placed
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Uniform point in `bounds` shrunk by the edge margin. A degenerate
    /// rectangle yields its centre on the collapsed axis.
    fn random_position(&mut self, bounds: &Bounds) -> Vec2 {
        let area = bounds.inset(self.config.edge_margin);
        let x = self.rng.random_range(area.min.x..=area.max.x);
        let y = self.rng.random_range(area.min.y..=area.max.y);
        Vec2::new(x, y)
    }

    fn random_speed(&mut self) -> f32 {
        let (lo, hi) = (self.config.speed_min, self.config.speed_max);
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }
}
