use std::cell::RefCell;
use std::rc::Rc;

use rewind_engine::{BodyKey, PhysicsBody, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Aabb {
    pub(crate) center: Vec2,
    pub(crate) half_extents: Vec2,
}

impl Aabb {
    pub(crate) fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub(crate) fn overlaps(&self, other: &Aabb) -> bool {
        (self.center.x - other.center.x).abs() < self.half_extents.x + other.half_extents.x
            && (self.center.y - other.center.y).abs() < self.half_extents.y + other.half_extents.y
    }

    pub(crate) fn contains(&self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extents.x
            && (point.y - self.center.y).abs() <= self.half_extents.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PhysicsSettings {
    pub(crate) gravity: f32,
    pub(crate) ground_y: f32,
    pub(crate) max_fall_speed: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: -30.0,
            ground_y: 0.0,
            max_fall_speed: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RigidBody {
    pub(crate) key: BodyKey,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) velocity: Vec2,
    pub(crate) angular_velocity: f32,
    pub(crate) half_extents: Vec2,
    pub(crate) simulated: bool,
    pub(crate) collision_enabled: bool,
    pub(crate) grounded: bool,
    ignored: Vec<BodyKey>,
}

impl RigidBody {
    fn new(key: BodyKey, position: Vec2, half_extents: Vec2) -> Self {
        Self {
            key,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            half_extents,
            simulated: true,
            collision_enabled: true,
            grounded: false,
            ignored: Vec::new(),
        }
    }

    pub(crate) fn bounds(&self) -> Aabb {
        Aabb::new(self.position, self.half_extents)
    }

    pub(crate) fn ignores(&self, other: BodyKey) -> bool {
        self.ignored.contains(&other)
    }
}

type BodyCell = Rc<RefCell<RigidBody>>;

/// Shared handle onto one body of a [`PhysicsWorld`]. Gameplay code and the
/// timeline each hold one.
#[derive(Debug, Clone)]
pub(crate) struct BodyHandle {
    cell: BodyCell,
}

impl BodyHandle {
    pub(crate) fn key(&self) -> BodyKey {
        self.cell.borrow().key
    }

    pub(crate) fn snapshot(&self) -> RigidBody {
        self.cell.borrow().clone()
    }

    pub(crate) fn bounds(&self) -> Aabb {
        self.cell.borrow().bounds()
    }

    pub(crate) fn is_grounded(&self) -> bool {
        self.cell.borrow().grounded
    }

    /// Moves the body without touching its velocity, e.g. a respawn.
    pub(crate) fn teleport(&self, position: Vec2) {
        let mut body = self.cell.borrow_mut();
        body.position = position;
        body.velocity = Vec2::ZERO;
        body.angular_velocity = 0.0;
        body.grounded = false;
    }

    pub(crate) fn set_horizontal_velocity(&self, vx: f32) {
        self.cell.borrow_mut().velocity.x = vx;
    }

    pub(crate) fn set_vertical_velocity(&self, vy: f32) {
        let mut body = self.cell.borrow_mut();
        body.velocity.y = vy;
        body.grounded = false;
    }
}

impl PhysicsBody for BodyHandle {
    fn body_key(&self) -> BodyKey {
        self.key()
    }

    fn position(&self) -> Vec2 {
        self.cell.borrow().position
    }

    fn rotation(&self) -> f32 {
        self.cell.borrow().rotation
    }

    fn velocity(&self) -> Vec2 {
        self.cell.borrow().velocity
    }

    fn angular_velocity(&self) -> f32 {
        self.cell.borrow().angular_velocity
    }

    fn set_position(&mut self, position: Vec2) {
        self.cell.borrow_mut().position = position;
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.cell.borrow_mut().rotation = rotation;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.cell.borrow_mut().velocity = velocity;
    }

    fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.cell.borrow_mut().angular_velocity = angular_velocity;
    }

    fn set_simulated(&mut self, simulated: bool) {
        self.cell.borrow_mut().simulated = simulated;
    }

    fn collision_enabled(&self) -> bool {
        self.cell.borrow().collision_enabled
    }

    fn set_collision_enabled(&mut self, enabled: bool) {
        self.cell.borrow_mut().collision_enabled = enabled;
    }

    fn ignore_collision_with(&mut self, other: BodyKey, ignore: bool) {
        let mut body = self.cell.borrow_mut();
        body.ignored.retain(|key| *key != other);
        if ignore {
            body.ignored.push(other);
        }
    }
}

#[derive(Debug, Default)]
struct WorldBodies {
    bodies: Vec<BodyCell>,
    next_key: u64,
}

/// A tiny gravity-and-boxes world. Cloning it yields another handle onto the
/// same bodies, which is how the replica factory spawns into it.
#[derive(Debug, Clone, Default)]
pub(crate) struct PhysicsWorld {
    bodies: Rc<RefCell<WorldBodies>>,
    settings: PhysicsSettings,
}

impl PhysicsWorld {
    pub(crate) fn spawn_body(&self, position: Vec2, half_extents: Vec2) -> BodyHandle {
        let mut world = self.bodies.borrow_mut();
        let key = BodyKey(world.next_key);
        world.next_key = world.next_key.saturating_add(1);
        let cell = Rc::new(RefCell::new(RigidBody::new(key, position, half_extents)));
        world.bodies.push(Rc::clone(&cell));
        BodyHandle { cell }
    }

    pub(crate) fn remove_body(&self, key: BodyKey) -> bool {
        let mut world = self.bodies.borrow_mut();
        let before = world.bodies.len();
        world.bodies.retain(|cell| cell.borrow().key != key);
        world.bodies.len() != before
    }

    pub(crate) fn body_count(&self) -> usize {
        self.bodies.borrow().bodies.len()
    }


    /// Integrates simulated bodies, lands them on the ground plane and pushes
    /// overlapping colliders apart. Kinematic bodies are left where scripts
    /// put them.
    pub(crate) fn step(&self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let bodies = self.bodies.borrow().bodies.clone();
        for cell in &bodies {
            integrate(&mut cell.borrow_mut(), self.settings, dt);
        }
        for (index, first) in bodies.iter().enumerate() {
            for second in &bodies[index + 1..] {
                separate(&mut first.borrow_mut(), &mut second.borrow_mut());
            }
        }
    }
}

fn integrate(body: &mut RigidBody, settings: PhysicsSettings, dt: f32) {
    if !body.simulated {
        return;
    }
    body.velocity.y = (body.velocity.y + settings.gravity * dt).max(-settings.max_fall_speed);
    body.position.x += body.velocity.x * dt;
    body.position.y += body.velocity.y * dt;
    body.rotation += body.angular_velocity * dt;
    body.grounded = false;

    let floor = settings.ground_y + body.half_extents.y;
    if body.collision_enabled && body.position.y <= floor {
        body.position.y = floor;
        body.velocity.y = body.velocity.y.max(0.0);
        body.grounded = true;
    }
}

fn separate(a: &mut RigidBody, b: &mut RigidBody) {
    if !a.collision_enabled || !b.collision_enabled {
        return;
    }
    if a.ignores(b.key) || b.ignores(a.key) {
        return;
    }
    if !a.simulated && !b.simulated {
        return;
    }
    if !a.bounds().overlaps(&b.bounds()) {
        return;
    }

    let dx = b.position.x - a.position.x;
    let dy = b.position.y - a.position.y;
    let overlap_x = a.half_extents.x + b.half_extents.x - dx.abs();
    let overlap_y = a.half_extents.y + b.half_extents.y - dy.abs();
    let (share_a, share_b) = match (a.simulated, b.simulated) {
        (true, true) => (0.5, 0.5),
        (true, false) => (1.0, 0.0),
        _ => (0.0, 1.0),
    };

    if overlap_x < overlap_y {
        let sign = if dx >= 0.0 { 1.0 } else { -1.0 };
        a.position.x -= sign * overlap_x * share_a;
        b.position.x += sign * overlap_x * share_b;
        return;
    }

    let sign = if dy >= 0.0 { 1.0 } else { -1.0 };
    a.position.y -= sign * overlap_y * share_a;
    b.position.y += sign * overlap_y * share_b;
    // Whichever body ended up on top is now standing on the other.
    let upper = if sign > 0.0 { b } else { a };
    if upper.simulated {
        upper.velocity.y = upper.velocity.y.max(0.0);
        upper.grounded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Vec2 = Vec2::new(0.5, 0.5);

    #[test]
    fn falling_body_lands_on_ground() {
        let world = PhysicsWorld::default();
        let body = world.spawn_body(Vec2::new(0.0, 3.0), UNIT);
        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }
        let state = body.snapshot();
        assert_eq!(state.position.y, 0.5);
        assert_eq!(state.velocity.y, 0.0);
        assert!(state.grounded);
    }

    #[test]
    fn kinematic_body_ignores_gravity() {
        let world = PhysicsWorld::default();
        let mut body = world.spawn_body(Vec2::new(0.0, 3.0), UNIT);
        body.set_simulated(false);
        world.step(0.5);
        assert_eq!(body.snapshot().position, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn overlapping_bodies_are_pushed_apart_unless_ignored() {
        let world = PhysicsWorld::default();
        let left = world.spawn_body(Vec2::new(0.0, 0.5), UNIT);
        let mut right = world.spawn_body(Vec2::new(0.6, 0.5), UNIT);
        world.step(1.0 / 60.0);
        let gap = right.snapshot().position.x - left.snapshot().position.x;
        assert!((gap - 1.0).abs() < 1e-5, "gap={gap}");

        right.set_position(Vec2::new(0.6, 0.5));
        right.ignore_collision_with(left.key(), true);
        world.step(1.0 / 60.0);
        assert!((right.snapshot().position.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn disabled_collision_falls_through_ground() {
        let world = PhysicsWorld::default();
        let mut body = world.spawn_body(Vec2::new(0.0, 0.5), UNIT);
        body.set_collision_enabled(false);
        world.step(0.1);
        assert!(body.snapshot().position.y < 0.5);
    }

    #[test]
    fn removed_bodies_stop_simulating() {
        let world = PhysicsWorld::default();
        let body = world.spawn_body(Vec2::new(0.0, 3.0), UNIT);
        assert_eq!(world.body_count(), 1);
        assert!(world.remove_body(body.key()));
        assert!(!world.remove_body(body.key()));
        world.step(0.1);
        assert_eq!(body.snapshot().position.y, 3.0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn aabb_contains_its_edges() {
        let zone = Aabb::new(Vec2::new(2.0, 1.0), Vec2::new(1.0, 1.0));
        assert!(zone.contains(Vec2::new(3.0, 2.0)));
        assert!(!zone.contains(Vec2::new(3.01, 1.0)));
    }
}
