//! RailState: the ordered list of displayed entities.
//!
//! Design:
//! - Insertion order is display order.
//! - A replaced entity takes its predecessor's index; only removal shifts
//!   later entities down.
//! - `revision` increases on every committed list mutation, so callers can
//!   tell whether anything was written.
//! - This type is plain data. Locking and renderer notification live in
//!   [`super::Rail`].

use crate::domain::{AnimationPhase, AnimationState, Channel, Entity, EntityId, RailError};

/// What a successful `replace` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
    /// Substituted in place at `index`.
    Substituted { index: usize, revision: u64 },
    /// Removed from `index`.
    Removed { index: usize, revision: u64 },
}

impl Replaced {
    pub fn revision(self) -> u64 {
        match self {
            Replaced::Substituted { revision, .. } | Replaced::Removed { revision, .. } => revision,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RailState {
    entities: Vec<Entity>,
    initialized: bool,
    revision: u64,
    /// Start offset of an entering card.
    y_delta: f64,
}

impl RailState {
    pub fn new(y_delta: f64) -> Self {
        Self {
            entities: Vec::new(),
            initialized: false,
            revision: 0,
            y_delta,
        }
    }

    /// Populate the rail once. Every entity starts `Idle`.
    pub fn initialize(&mut self, entities: Vec<Entity>) -> Result<u64, RailError> {
        if self.initialized {
            return Err(RailError::AlreadyInitialized);
        }
        for (i, e) in entities.iter().enumerate() {
            if entities[..i].iter().any(|prev| prev.id == e.id) {
                return Err(RailError::DuplicateEntity(e.id.clone()));
            }
        }
        self.entities = entities
            .into_iter()
            .map(|mut e| {
                e.animation = AnimationState::idle();
                e
            })
            .collect();
        self.initialized = true;
        self.revision += 1;
        Ok(self.revision)
    }

    /// Replace `old_id` with `new`, or remove it when `new` is `None`.
    ///
    /// The lookup and the write happen in one call; callers holding the rail
    /// lock get an atomic lookup-then-mutate.
    pub fn replace(&mut self, old_id: &EntityId, new: Option<Entity>) -> Result<Replaced, RailError> {
        let index = self
            .index_of(old_id)
            .ok_or_else(|| RailError::EntityNotFound(old_id.clone()))?;

        match new {
            Some(mut entity) => {
                let clash = self
                    .entities
                    .iter()
                    .enumerate()
                    .any(|(i, e)| i != index && e.id == entity.id);
                if clash {
                    return Err(RailError::DuplicateEntity(entity.id));
                }
                entity.animation = AnimationState::entering(self.y_delta);
                self.entities[index] = entity;
                self.revision += 1;
                Ok(Replaced::Substituted {
                    index,
                    revision: self.revision,
                })
            }
            None => {
                self.entities.remove(index);
                self.revision += 1;
                Ok(Replaced::Removed {
                    index,
                    revision: self.revision,
                })
            }
        }
    }

    /// Update one animation channel. No-op (returns false) when `id` is gone.
    pub fn set_animation_progress(&mut self, id: &EntityId, channel: Channel, value: f64) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.animation.set(channel, value);
                true
            }
            None => false,
        }
    }

    /// Same no-op semantics as `set_animation_progress`.
    pub fn set_animation_phase(&mut self, id: &EntityId, phase: AnimationPhase) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.animation.phase = phase;
                true
            }
            None => false,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| &e.id == id)
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.entities.iter().position(|e| &e.id == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
