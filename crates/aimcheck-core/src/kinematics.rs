//! Position/velocity integration with wall reflection.
//!
//! All entity kinds share one contract, `integrate(entity, dt, bounds)`; the
//! entity's [`Motion`] picks the velocity update rule applied before the
//! position step.

use glam::Vec2;

use crate::entity::{Entity, Motion};
use crate::geometry::Bounds;

/// Return a copy of `entity` advanced by `dt` seconds inside `bounds`.
pub fn integrate(entity: &Entity, dt: f32, bounds: &Bounds) -> Entity {
    let mut next = *entity;
    advance(&mut next, dt, bounds);
    next
}

/// In-place form of [`integrate`]. Returns true if the position changed.
pub fn advance(entity: &mut Entity, dt: f32, bounds: &Bounds) -> bool {
    if !dt.is_finite() || dt <= 0.0 {
        return false;
    }

    let prev_position = entity.position;
    let prev_velocity = entity.velocity;

    match entity.motion {
        Motion::Static => return false,
        Motion::Linear => {},
        Motion::Circling {
            angular_rate,
            speed,
        } => {
            entity.heading = (entity.heading + angular_rate * dt).rem_euclid(std::f32::consts::TAU);
            entity.velocity = Vec2::from_angle(entity.heading) * speed;
        },
    }

    let mut position = entity.position + entity.velocity * dt;
    let mut velocity = entity.velocity;
    let reflected_x = reflect_axis(&mut position.x, &mut velocity.x, bounds.min.x, bounds.max.x);
    let reflected_y = reflect_axis(&mut position.y, &mut velocity.y, bounds.min.y, bounds.max.y);

    if !position.is_finite() || !velocity.is_finite() {
        tracing::warn!(
            id = %entity.id,
            ?prev_position,
            ?prev_velocity,
            "Non-finite kinematics result, freezing entity"
        );
        entity.position = if prev_position.is_finite() {
            bounds.clamp(prev_position)
        } else {
            bounds.center()
        };
        entity.velocity = Vec2::ZERO;
        return entity.position != prev_position;
    }

    entity.position = position;
    entity.velocity = velocity;
    if (reflected_x || reflected_y) && matches!(entity.motion, Motion::Circling { .. }) {
        entity.heading = velocity.y.atan2(velocity.x);
    }
    entity.position != prev_position
}

/// Move a free point (the player crosshair) along `direction` at `speed`
/// units/s, clamped to `bounds`. Direction is normalized; zero means stay.
pub fn steer(position: Vec2, direction: Vec2, speed: f32, dt: f32, bounds: &Bounds) -> Vec2 {
    if !dt.is_finite() || dt <= 0.0 || !speed.is_finite() || !direction.is_finite() {
        return position;
    }
    let next = position + direction.normalize_or_zero() * speed * dt;
    if next.is_finite() {
        bounds.clamp(next)
    } else {
        position
    }
}

/// Reflect the velocity component if the position has reached an edge while
/// moving outward, then clamp the position into `[min, max]`.
fn reflect_axis(pos: &mut f32, vel: &mut f32, min: f32, max: f32) -> bool {
    if !pos.is_finite() {
        return false;
    }
    let mut reflected = false;
    if (*pos <= min && *vel < 0.0) || (*pos >= max && *vel > 0.0) {
        *vel = -*vel;
        reflected = true;
    }
    *pos = pos.clamp(min, max);
    reflected
}
