//! ScriptedWorld: детерминированный backend без детекции коллизий
//!
//! Интегрирует velocity → position (с гравитацией) для включённых dynamic тел.
//! Контакты не вычисляются: вызывающий код ставит их в очередь через
//! `queue_begin`/`queue_end`, они доставляются listener'у на следующем `step`.
//! Используется в тестах frame loop и для воспроизведения edge cases
//! (End без Begin, повторные контакты в одном шаге).

use std::collections::BTreeMap;

use bevy::math::{Quat, Vec3};

use super::{
    BodyDesc, BodyHandle, BodySnapshot, ContactBody, ContactEvent, ContactListener, PhysicsWorld,
    StepCommands,
};

#[derive(Debug, Clone, Copy)]
struct ScriptedBody {
    position: Vec3,
    rotation: Quat,
    linvel: Vec3,
    mass: f32,
    enabled: bool,
}

impl ScriptedBody {
    fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

#[derive(Debug, Default)]
pub struct ScriptedWorld {
    gravity: Vec3,
    bodies: BTreeMap<BodyHandle, ScriptedBody>,
    next_handle: u64,
    queued: Vec<(bool, BodyHandle, BodyHandle)>,
    impulses: Vec<(BodyHandle, Vec3)>,
    steps: u64,
}

impl ScriptedWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            next_handle: 1,
            ..Default::default()
        }
    }

    /// Begin контакт на следующем `step`
    pub fn queue_begin(&mut self, a: BodyHandle, b: BodyHandle) {
        self.queued.push((true, a, b));
    }

    /// End контакт на следующем `step`
    pub fn queue_end(&mut self, a: BodyHandle, b: BodyHandle) {
        self.queued.push((false, a, b));
    }

    /// Все импульсы, применённые с момента создания
    pub fn impulses(&self) -> &[(BodyHandle, Vec3)] {
        &self.impulses
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn contact_body(&self, handle: BodyHandle) -> Option<ContactBody> {
        self.bodies.get(&handle).map(|body| ContactBody {
            handle,
            is_static: body.is_static(),
        })
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle.max(1));
        self.next_handle = handle.0 + 1;
        self.bodies.insert(
            handle,
            ScriptedBody {
                position: desc.position,
                rotation: desc.rotation,
                linvel: if desc.is_static() { Vec3::ZERO } else { desc.linvel },
                mass: desc.mass.max(0.0),
                enabled: true,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle).is_some()
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body(&self, handle: BodyHandle) -> Option<BodySnapshot> {
        self.bodies.get(&handle).map(|body| BodySnapshot {
            position: body.position,
            rotation: body.rotation,
            linvel: body.linvel,
            is_static: body.is_static(),
            enabled: body.enabled,
        })
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if !body.is_static() {
                body.linvel = linvel;
            }
        }
    }

    fn set_translation(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
        }
    }

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.rotation = rotation;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            if !body.is_static() && body.enabled {
                body.linvel += impulse / body.mass;
                self.impulses.push((handle, impulse));
            }
        }
    }

    fn disable_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.enabled = false;
            body.linvel = Vec3::ZERO;
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        self.steps += 1;

        for body in self.bodies.values_mut() {
            if body.is_static() || !body.enabled {
                continue;
            }
            body.linvel += self.gravity * dt;
            body.position += body.linvel * dt;
        }

        let mut commands = StepCommands::default();
        for (started, a, b) in std::mem::take(&mut self.queued) {
            let (Some(a), Some(b)) = (self.contact_body(a), self.contact_body(b)) else {
                continue;
            };
            let contact = if started {
                ContactEvent::begin(a, b)
            } else {
                ContactEvent::end(a, b)
            };
            listener.on_contact(&contact, &mut commands);
        }

        let disabled: Vec<BodyHandle> = commands.drain_disabled().collect();
        for handle in disabled {
            self.disable_body(handle);
        }
    }
}
