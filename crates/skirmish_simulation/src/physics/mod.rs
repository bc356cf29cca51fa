//! Physics world contract
//!
//! Core не зависит от конкретного движка: только от `PhysicsWorld`:
//! - bodies создаются/удаляются только вне `step` (mark-then-defer)
//! - контакты одного sub-step доставляются в `ContactListener` синхронно,
//!   до возврата из `step`
//! - listener не может добавлять/удалять bodies, только отключать их через
//!   `StepCommands` (применяется до возврата из `step`)
//!
//! Backends:
//! - `RapierWorld`: rapier3d pipeline (игра, headless прогоны)
//! - `ScriptedWorld`: детерминированный integrator без детекции коллизий
//!   (контакты подаются вручную, для тестов frame loop)

use bevy::math::{Quat, Vec3};

pub mod contact;
pub mod rapier_world;
pub mod scripted;
pub mod stepper;

pub use contact::ContactCounter;
pub use rapier_world::RapierWorld;
pub use scripted::ScriptedWorld;
pub use stepper::FixedStepper;

/// Непрозрачный handle тела (стабилен до `remove_body`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Форма коллайдера
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// Collision layers (битовые маски)
///
/// - Player: Enemies + World
/// - Enemies: всё
/// - Projectiles: Enemies + World (не задевают стрелявшего и друг друга)
/// - World: всё
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionLayer {
    Player,
    Enemy,
    Projectile,
    World,
}

pub const LAYER_PLAYER: u32 = 0b0001;
pub const LAYER_ENEMIES: u32 = 0b0010;
pub const LAYER_PROJECTILES: u32 = 0b0100;
pub const LAYER_WORLD: u32 = 0b1000;

impl CollisionLayer {
    pub fn membership(self) -> u32 {
        match self {
            CollisionLayer::Player => LAYER_PLAYER,
            CollisionLayer::Enemy => LAYER_ENEMIES,
            CollisionLayer::Projectile => LAYER_PROJECTILES,
            CollisionLayer::World => LAYER_WORLD,
        }
    }

    pub fn filter(self) -> u32 {
        match self {
            CollisionLayer::Player => LAYER_ENEMIES | LAYER_WORLD,
            CollisionLayer::Enemy => LAYER_PLAYER | LAYER_ENEMIES | LAYER_PROJECTILES | LAYER_WORLD,
            CollisionLayer::Projectile => LAYER_ENEMIES | LAYER_WORLD,
            CollisionLayer::World => LAYER_PLAYER | LAYER_ENEMIES | LAYER_PROJECTILES | LAYER_WORLD,
        }
    }

    /// Симметричная проверка: оба слоя должны видеть друг друга
    pub fn interacts_with(self, other: CollisionLayer) -> bool {
        self.filter() & other.membership() != 0 && other.filter() & self.membership() != 0
    }
}

/// Описание тела для `add_body`
///
/// `mass == 0` → static (fixed) body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub mass: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub linear_damping: f32,
    pub friction: f32,
    pub lock_rotations: bool,
    pub layer: CollisionLayer,
}

impl BodyDesc {
    pub fn fixed(shape: BodyShape, position: Vec3) -> Self {
        Self {
            shape,
            mass: 0.0,
            position,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            linear_damping: 0.0,
            friction: 0.5,
            lock_rotations: false,
            layer: CollisionLayer::World,
        }
    }

    pub fn dynamic(shape: BodyShape, mass: f32, position: Vec3) -> Self {
        Self {
            mass,
            ..Self::fixed(shape, position)
        }
    }

    pub fn with_linvel(mut self, linvel: Vec3) -> Self {
        self.linvel = linvel;
        self
    }

    pub fn with_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn locked_rotations(mut self) -> Self {
        self.lock_rotations = true;
        self
    }

    pub fn in_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }
}

/// Read-only состояние тела после шага
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub is_static: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// Одна сторона контакта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactBody {
    pub handle: BodyHandle,
    /// mass == 0 (fixed/kinematic)
    pub is_static: bool,
}

/// Begin/end контакт между двумя телами (transient, не хранится)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: ContactBody,
    pub b: ContactBody,
}

impl ContactEvent {
    pub fn begin(a: ContactBody, b: ContactBody) -> Self {
        Self {
            phase: ContactPhase::Begin,
            a,
            b,
        }
    }

    pub fn end(a: ContactBody, b: ContactBody) -> Self {
        Self {
            phase: ContactPhase::End,
            a,
            b,
        }
    }

    /// Вторая сторона контакта, если `handle` в нём участвует
    pub fn partner_of(&self, handle: BodyHandle) -> Option<ContactBody> {
        if self.a.handle == handle {
            Some(self.b)
        } else if self.b.handle == handle {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Отложенные команды, которые listener может выдать изнутри `step`
#[derive(Debug, Default)]
pub struct StepCommands {
    disabled: Vec<BodyHandle>,
}

impl StepCommands {
    /// Усыпить и исключить тело из генерации контактов
    pub fn disable_body(&mut self, handle: BodyHandle) {
        if !self.disabled.contains(&handle) {
            self.disabled.push(handle);
        }
    }

    pub fn drain_disabled(&mut self) -> std::vec::Drain<'_, BodyHandle> {
        self.disabled.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}

/// Получатель контактов внутри `PhysicsWorld::step`
pub trait ContactListener {
    fn on_contact(&mut self, contact: &ContactEvent, commands: &mut StepCommands);
}

impl<F> ContactListener for F
where
    F: FnMut(&ContactEvent, &mut StepCommands),
{
    fn on_contact(&mut self, contact: &ContactEvent, commands: &mut StepCommands) {
        self(contact, commands)
    }
}

/// Контракт физического мира, на который опирается core
pub trait PhysicsWorld: Send + Sync {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Удаляет тело вместе с коллайдерами. `false` если handle неизвестен.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn contains(&self, handle: BodyHandle) -> bool;

    fn body(&self, handle: BodyHandle) -> Option<BodySnapshot>;

    fn body_count(&self) -> usize;

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3);

    fn set_translation(&mut self, handle: BodyHandle, position: Vec3);

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat);

    /// Импульс в центр масс
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3);

    fn disable_body(&mut self, handle: BodyHandle);

    /// Один фиксированный sub-step. Контакты доставляются синхронно.
    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener);
}
