use std::collections::BTreeMap;

use super::{EntityHandle, PrimitiveKind, SceneHost, StyleAttrs};
use crate::kernel::pose::Pose;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntity {
    pub kind: PrimitiveKind,
    pub pose: Pose,
    pub style: StyleAttrs,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Create(EntityHandle),
    Visibility(EntityHandle, bool),
    Pose(EntityHandle, Pose),
}

/// Scene host that keeps the entity table in memory and logs every command.
#[derive(Debug, Default)]
pub struct RecordingSceneHost {
    next: u64,
    entities: BTreeMap<EntityHandle, RecordedEntity>,
    commands: Vec<SceneCommand>,
}

impl RecordingSceneHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&RecordedEntity> {
        self.entities.get(&handle)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&EntityHandle, &RecordedEntity)> {
        self.entities.iter()
    }

    pub fn boxes(&self) -> Vec<&RecordedEntity> {
        self.entities
            .values()
            .filter(|e| matches!(e.kind, PrimitiveKind::Box { .. }))
            .collect()
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }
}

impl SceneHost for RecordingSceneHost {
    fn create_primitive(&mut self, kind: PrimitiveKind, pose: &Pose, style: &StyleAttrs) -> EntityHandle {
        self.next += 1;
        let handle = EntityHandle(self.next);
        self.entities.insert(handle, RecordedEntity { kind, pose: *pose, style: *style, visible: true });
        self.commands.push(SceneCommand::Create(handle));
        handle
    }

    fn set_entity_visibility(&mut self, handle: EntityHandle, visible: bool) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.visible = visible;
        }
        self.commands.push(SceneCommand::Visibility(handle, visible));
    }

    fn set_entity_pose(&mut self, handle: EntityHandle, pose: &Pose) {
        if let Some(entity) = self.entities.get_mut(&handle) {
            entity.pose = *pose;
        }
        self.commands.push(SceneCommand::Pose(handle, *pose));
    }
}
