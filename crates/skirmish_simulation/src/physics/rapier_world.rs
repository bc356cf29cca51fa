//! Rapier-backed physics world
//!
//! Архитектура:
//! - Rapier владеет RigidBodySet/ColliderSet, мы держим только
//!   `BodyHandle ↔ RigidBodyHandle` и `ColliderHandle → BodyHandle` карты
//! - CollisionEvent собираются EventHandler'ом во время `pipeline.step`,
//!   после sub-step переводятся в `ContactEvent` и отдаются listener'у
//! - `StepCommands` (disable body) применяются сразу после dispatch,
//!   т.е. до следующего sub-step
//!
//! Детерминизм: rapier3d с `enhanced-determinism`, фиксированный dt.

use std::collections::HashMap;
use std::sync::Mutex;

use bevy::math::{Quat, Vec3};
use rapier3d::math::{Real, Rotation, Vector};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

use super::{
    BodyDesc, BodyHandle, BodyShape, BodySnapshot, ContactBody, ContactEvent, ContactListener,
    ContactPhase, PhysicsWorld, StepCommands,
};

fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &Rotation<Real>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

/// Сырые события одного sub-step (EventHandler требует Send + Sync, поэтому Mutex)
#[derive(Default)]
struct CollisionBuffer {
    events: Mutex<Vec<CollisionEvent>>,
}

impl CollisionBuffer {
    fn take(&self) -> Vec<CollisionEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventHandler for CollisionBuffer {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collision_buffer: CollisionBuffer,
    next_handle: u64,
    handles: HashMap<BodyHandle, RigidBodyHandle>,
    collider_owners: HashMap<ColliderHandle, BodyHandle>,
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collision_buffer: CollisionBuffer::default(),
            next_handle: 1,
            handles: HashMap::new(),
            collider_owners: HashMap::new(),
        }
    }

    fn rigid_body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.handles
            .get(&handle)
            .and_then(|raw| self.bodies.get(*raw))
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let raw = *self.handles.get(&handle)?;
        self.bodies.get_mut(raw)
    }

    fn contact_body(&self, collider: ColliderHandle) -> Option<ContactBody> {
        let handle = *self.collider_owners.get(&collider)?;
        let body = self.rigid_body(handle)?;
        Some(ContactBody {
            handle,
            is_static: !body.is_dynamic(),
        })
    }

    fn build_collider(desc: &BodyDesc) -> Collider {
        let builder = match desc.shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        };

        let groups = InteractionGroups::new(
            Group::from_bits_truncate(desc.layer.membership()),
            Group::from_bits_truncate(desc.layer.filter()),
        );

        let builder = builder
            .friction(desc.friction)
            .collision_groups(groups)
            .active_events(ActiveEvents::COLLISION_EVENTS);

        if desc.is_static() {
            builder.build()
        } else {
            builder.mass(desc.mass).build()
        }
    }
}

impl PhysicsWorld for RapierWorld {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = if desc.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .linvel(to_vector(desc.linvel))
                .linear_damping(desc.linear_damping)
        };

        let mut builder = builder.translation(to_vector(desc.position));
        if desc.lock_rotations {
            builder = builder.lock_rotations();
        }

        let mut rigid_body = builder.build();
        rigid_body.set_rotation(to_rotation(desc.rotation), false);

        let raw = self.bodies.insert(rigid_body);
        let collider = self
            .colliders
            .insert_with_parent(Self::build_collider(desc), raw, &mut self.bodies);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, raw);
        self.collider_owners.insert(collider, handle);
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(raw) = self.handles.remove(&handle) else {
            return false;
        };

        self.collider_owners.retain(|_, owner| *owner != handle);
        self.bodies
            .remove(
                raw,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.handles.contains_key(&handle)
    }

    fn body(&self, handle: BodyHandle) -> Option<BodySnapshot> {
        let body = self.rigid_body(handle)?;
        Some(BodySnapshot {
            position: from_vector(body.translation()),
            rotation: from_rotation(body.rotation()),
            linvel: from_vector(body.linvel()),
            is_static: !body.is_dynamic(),
            enabled: body.is_enabled(),
        })
    }

    fn body_count(&self) -> usize {
        self.handles.len()
    }

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_linvel(to_vector(linvel), true);
        }
    }

    fn set_translation(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_translation(to_vector(position), true);
        }
    }

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_rotation(to_rotation(rotation), true);
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    fn disable_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_linvel(Vector::zeros(), false);
            body.sleep();
            body.set_enabled(false);
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collision_buffer,
        );

        let mut commands = StepCommands::default();
        for raw in self.collision_buffer.take() {
            // Коллайдеры удалённых тел уже не резолвятся: такой End пропускаем
            let (Some(a), Some(b)) = (
                self.contact_body(raw.collider1()),
                self.contact_body(raw.collider2()),
            ) else {
                continue;
            };

            let phase = if raw.started() {
                ContactPhase::Begin
            } else {
                ContactPhase::End
            };
            listener.on_contact(&ContactEvent { phase, a, b }, &mut commands);
        }

        let disabled: Vec<BodyHandle> = commands.drain_disabled().collect();
        for handle in disabled {
            self.disable_body(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::CollisionLayer;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_ground() -> (RapierWorld, BodyHandle) {
        let mut world = RapierWorld::new(Vec3::new(0.0, -9.82, 0.0));
        let ground = world.add_body(&BodyDesc::fixed(
            BodyShape::Cuboid {
                half_extents: Vec3::new(20.0, 0.5, 20.0),
            },
            Vec3::new(0.0, -0.5, 0.0),
        ));
        (world, ground)
    }

    #[test]
    fn test_ball_lands_on_ground() {
        let (mut world, ground) = world_with_ground();
        let ball = world.add_body(
            &BodyDesc::dynamic(BodyShape::Ball { radius: 0.5 }, 1.0, Vec3::new(0.0, 1.5, 0.0))
                .in_layer(CollisionLayer::Player),
        );

        let mut begins = Vec::new();
        for _ in 0..120 {
            world.step(DT, &mut |contact: &ContactEvent, _: &mut StepCommands| {
                if contact.phase == ContactPhase::Begin {
                    begins.push(*contact);
                }
            });
        }

        let landing = begins
            .iter()
            .find_map(|c| c.partner_of(ball))
            .expect("ball must touch the ground");
        assert_eq!(landing.handle, ground);
        assert!(landing.is_static);

        let state = world.body(ball).unwrap();
        assert!(state.position.y < 1.0 && state.position.y > 0.0, "y = {}", state.position.y);
    }

    #[test]
    fn test_remove_body() {
        let (mut world, ground) = world_with_ground();
        let ball = world.add_body(&BodyDesc::dynamic(
            BodyShape::Ball { radius: 0.2 },
            1.0,
            Vec3::new(0.0, 3.0, 0.0),
        ));
        assert_eq!(world.body_count(), 2);

        assert!(world.remove_body(ball));
        assert!(!world.remove_body(ball));
        assert!(!world.contains(ball));
        assert!(world.contains(ground));
        assert!(world.body(ball).is_none());

        // Шаг после удаления не паникует и не отдаёт контакты мёртвого тела
        world.step(DT, &mut |contact: &ContactEvent, _: &mut StepCommands| {
            assert!(contact.partner_of(ball).is_none());
        });
    }

    #[test]
    fn test_disable_body_from_listener() {
        let (mut world, ground) = world_with_ground();
        let ball = world.add_body(&BodyDesc::dynamic(
            BodyShape::Ball { radius: 0.5 },
            1.0,
            Vec3::new(0.0, 0.6, 0.0),
        ));

        for _ in 0..60 {
            world.step(DT, &mut |contact: &ContactEvent, commands: &mut StepCommands| {
                if contact.partner_of(ground).is_some() {
                    commands.disable_body(ball);
                }
            });
        }

        let state = world.body(ball).unwrap();
        assert!(!state.enabled);
        assert_eq!(state.linvel, Vec3::ZERO);
    }

    #[test]
    fn test_rotation_roundtrip() {
        let (mut world, _) = world_with_ground();
        let body = world.add_body(
            &BodyDesc::dynamic(BodyShape::Ball { radius: 0.5 }, 1.0, Vec3::new(0.0, 5.0, 0.0))
                .locked_rotations(),
        );

        let yaw = Quat::from_rotation_y(0.75);
        world.set_rotation(body, yaw);
        let read = world.body(body).unwrap().rotation;
        assert!(read.angle_between(yaw) < 1e-4);
    }

    #[test]
    fn test_impulse_changes_velocity() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let body = world.add_body(&BodyDesc::dynamic(
            BodyShape::Ball { radius: 0.5 },
            2.0,
            Vec3::ZERO,
        ));

        // Первый шаг: rapier пересчитывает mass properties из коллайдера
        world.step(DT, &mut |_: &ContactEvent, _: &mut StepCommands| {});
        world.apply_impulse(body, Vec3::new(0.0, 4.0, 0.0));
        world.step(DT, &mut |_: &ContactEvent, _: &mut StepCommands| {});

        let vy = world.body(body).unwrap().linvel.y;
        assert!((vy - 2.0).abs() < 0.05, "vy = {}", vy);
    }
}
