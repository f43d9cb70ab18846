//! Render/display collaborator.
//!
//! The engine never draws. It reports entity lifecycle, score, time and
//! status changes to a [`RenderSink`] owned by the host.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::outcome::{ChallengeStatus, StatusPayload};

/// Receiver of render notifications. All methods default to no-ops so a
/// host only implements what it displays.
pub trait RenderSink {
    fn on_entity_created(&mut self, _entity: &Entity) {}

    fn on_entity_removed(&mut self, _id: EntityId) {}

    fn on_entity_moved(&mut self, _id: EntityId, _x: f32, _y: f32) {}

    fn on_player_moved(&mut self, _x: f32, _y: f32) {}

    fn on_score_changed(&mut self, _score: u32) {}

    fn on_time_changed(&mut self, _seconds: u32) {}

    fn on_status_changed(&mut self, _status: ChallengeStatus, _payload: &StatusPayload) {}
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {}

/// A recorded render notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    EntityCreated(Entity),
    EntityRemoved(EntityId),
    EntityMoved { id: EntityId, x: f32, y: f32 },
    PlayerMoved { x: f32, y: f32 },
    ScoreChanged(u32),
    TimeChanged(u32),
    StatusChanged {
        status: ChallengeStatus,
        payload: StatusPayload,
    },
}

/// Record commands in order, for headless hosts and tests.
impl RenderSink for Vec<RenderCommand> {
    fn on_entity_created(&mut self, entity: &Entity) {
        self.push(RenderCommand::EntityCreated(*entity));
    }

    fn on_entity_removed(&mut self, id: EntityId) {
        self.push(RenderCommand::EntityRemoved(id));
    }

    fn on_entity_moved(&mut self, id: EntityId, x: f32, y: f32) {
        self.push(RenderCommand::EntityMoved { id, x, y });
    }

    fn on_player_moved(&mut self, x: f32, y: f32) {
        self.push(RenderCommand::PlayerMoved { x, y });
    }

    fn on_score_changed(&mut self, score: u32) {
        self.push(RenderCommand::ScoreChanged(score));
    }

    fn on_time_changed(&mut self, seconds: u32) {
        self.push(RenderCommand::TimeChanged(seconds));
    }

    fn on_status_changed(&mut self, status: ChallengeStatus, payload: &StatusPayload) {
        self.push(RenderCommand::StatusChanged {
            status,
            payload: payload.clone(),
        });
    }
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn on_entity_created(&mut self, entity: &Entity) {
        (**self).on_entity_created(entity);
    }

    fn on_entity_removed(&mut self, id: EntityId) {
        (**self).on_entity_removed(id);
    }

    fn on_entity_moved(&mut self, id: EntityId, x: f32, y: f32) {
        (**self).on_entity_moved(id, x, y);
    }

    fn on_player_moved(&mut self, x: f32, y: f32) {
        (**self).on_player_moved(x, y);
    }

    fn on_score_changed(&mut self, score: u32) {
        (**self).on_score_changed(score);
    }

    fn on_time_changed(&mut self, seconds: u32) {
        (**self).on_time_changed(seconds);
    }

    fn on_status_changed(&mut self, status: ChallengeStatus, payload: &StatusPayload) {
        (**self).on_status_changed(status, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<RenderCommand> = Vec::new();
        let e = Entity::target(EntityId(1), Vec2::ZERO, Vec2::X, 40.0, 0);
        sink.on_entity_created(&e);
        sink.on_score_changed(10);
        sink.on_entity_removed(EntityId(1));
        assert_eq!(
            sink,
            vec![
                RenderCommand::EntityCreated(e),
                RenderCommand::ScoreChanged(10),
                RenderCommand::EntityRemoved(EntityId(1)),
            ]
        );
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut boxed: Box<Vec<RenderCommand>> = Box::default();
        boxed.on_time_changed(29);
        assert_eq!(*boxed, vec![RenderCommand::TimeChanged(29)]);
    }

    #[test]
    fn null_renderer_accepts_everything() {
        let mut sink = NullRenderer;
        sink.on_status_changed(ChallengeStatus::Idle, &StatusPayload::Reset);
        sink.on_player_moved(1.0, 2.0);
    }
}
