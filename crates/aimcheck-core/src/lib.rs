pub mod clock;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod kinematics;
pub mod outcome;
pub mod render;
pub mod time;
pub mod timers;
pub mod token;

pub use glam::Vec2;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use glam::Vec2;

    use crate::entity::{Entity, EntityId};
    use crate::geometry::Bounds;
    use crate::outcome::{ChallengeStatus, StatusPayload};
    use crate::render::RenderCommand;

    /// Square bounds `[0, size]` on both axes.
    pub fn square_bounds(size: f32) -> Bounds {
        Bounds::new(Vec2::ZERO, Vec2::splat(size))
    }

    /// A stationary gallery target at `(x, y)` with radius 40.
    pub fn still_target(id: u32, x: f32, y: f32) -> Entity {
        Entity::target(EntityId(id), Vec2::new(x, y), Vec2::ZERO, 40.0, 0)
    }

    /// Ids of every `EntityCreated` command, in order.
    pub fn created_ids(commands: &[RenderCommand]) -> Vec<EntityId> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::EntityCreated(e) => Some(e.id),
                _ => None,
            })
            .collect()
    }

    /// Ids of every `EntityRemoved` command, in order.
    pub fn removed_ids(commands: &[RenderCommand]) -> Vec<EntityId> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::EntityRemoved(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Every status notification, in order.
    pub fn statuses(commands: &[RenderCommand]) -> Vec<(ChallengeStatus, StatusPayload)> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::StatusChanged { status, payload } => {
                    Some((*status, payload.clone()))
                },
                _ => None,
            })
            .collect()
    }

    /// The most recent score notification, if any.
    pub fn last_score(commands: &[RenderCommand]) -> Option<u32> {
        commands.iter().rev().find_map(|c| match c {
            RenderCommand::ScoreChanged(s) => Some(*s),
            _ => None,
        })
    }

    /// Every time notification, in order.
    pub fn times(commands: &[RenderCommand]) -> Vec<u32> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::TimeChanged(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}
