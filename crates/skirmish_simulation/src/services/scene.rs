//! Scene collaborator: retained-mode visual instances
//!
//! Core знает только `VisualHandle`: spawn при создании entity,
//! set_transform в render sync, despawn в deferred removal.

use std::collections::BTreeMap;

use bevy::prelude::Transform;

use super::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Player,
    /// Контейнер камеры (yaw) + сама камера (pitch)
    CameraRig,
    Ground,
    Obstacle,
    Projectile,
    Enemy,
}

pub trait Scene: Send + Sync {
    fn spawn(&mut self, kind: VisualKind, material: Material, transform: Transform) -> VisualHandle;
    fn set_transform(&mut self, handle: VisualHandle, transform: Transform);
    /// `false` если handle уже удалён
    fn despawn(&mut self, handle: VisualHandle) -> bool;
    fn transform(&self, handle: VisualHandle) -> Option<Transform>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub kind: VisualKind,
    pub material: Material,
    pub transform: Transform,
}

/// In-memory scene graph (headless)
#[derive(Debug, Default)]
pub struct SceneBuffer {
    nodes: BTreeMap<VisualHandle, SceneNode>,
    next_id: u64,
}

impl SceneBuffer {
    pub fn node(&self, handle: VisualHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    pub fn count(&self, kind: VisualKind) -> usize {
        self.nodes.values().filter(|node| node.kind == kind).count()
    }
}

impl Scene for SceneBuffer {
    fn spawn(
        &mut self,
        kind: VisualKind,
        material: Material,
        transform: Transform,
    ) -> VisualHandle {
        self.next_id += 1;
        let handle = VisualHandle(self.next_id);
        self.nodes.insert(
            handle,
            SceneNode {
                kind,
                material,
                transform,
            },
        );
        handle
    }

    fn set_transform(&mut self, handle: VisualHandle, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.transform = transform;
        }
    }

    fn despawn(&mut self, handle: VisualHandle) -> bool {
        self.nodes.remove(&handle).is_some()
    }

    fn transform(&self, handle: VisualHandle) -> Option<Transform> {
        self.nodes.get(&handle).map(|node| node.transform)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
