//! Drag-and-drop state of the drop target

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identità di un elemento della vista (assegnata dal livello di presentazione)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Geometria logica della drop zone: la radice, i suoi discendenti e le label.
#[derive(Debug, Clone)]
pub struct DropZone {
    root: ElementId,
    descendants: HashSet<ElementId>,
    labels: HashSet<ElementId>,
}

impl DropZone {
    pub fn new(root: ElementId) -> Self {
        Self {
            root,
            descendants: HashSet::new(),
            labels: HashSet::new(),
        }
    }

    pub fn with_descendant(mut self, id: ElementId) -> Self {
        self.descendants.insert(id);
        self
    }

    /// Registra una label (o un elemento al suo interno); è anche un discendente
    pub fn with_label(mut self, id: ElementId) -> Self {
        self.descendants.insert(id);
        self.labels.insert(id);
        self
    }

    pub fn contains(&self, target: Option<ElementId>) -> bool {
        match target {
            Some(id) => id == self.root || self.descendants.contains(&id),
            None => false,
        }
    }

    /// La label attiva già il selettore file da sola
    pub fn is_label(&self, target: ElementId) -> bool {
        self.labels.contains(&target)
    }
}

impl Default for DropZone {
    fn default() -> Self {
        Self::new(ElementId(0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragSession {
    active: bool,
}

impl DragSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// dragenter/dragover. Returns true when the flag actually changed.
    pub fn hover(&mut self) -> bool {
        let changed = !self.active;
        self.active = true;
        changed
    }

    /// dragleave: only clears when the pointer left the zone entirely.
    pub fn leave(&mut self, zone: &DropZone, related_target: Option<ElementId>) -> bool {
        if !self.active || zone.contains(related_target) {
            return false;
        }
        self.active = false;
        true
    }

    /// drop: always clears; only the first transferred item is kept.
    pub fn drop_items<T>(&mut self, items: Vec<T>) -> Option<T> {
        self.active = false;
        items.into_iter().next()
    }
}
