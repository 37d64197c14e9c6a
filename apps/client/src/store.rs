//! Per-kind list state kept by the views, with reducers for each stage of
//! a request.

use resume_domain::{CustomResume, Record};
use uuid::Uuid;

/// Anything addressable by id inside a [`ResourceState`].
pub trait Identified {
    fn id(&self) -> Uuid;
}

impl<T> Identified for Record<T> {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identified for CustomResume {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T: Identified> ResourceState<T> {
    pub fn pending(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn rejected(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn loaded(&mut self, items: Vec<T>) {
        self.loading = false;
        self.error = None;
        self.items = items;
    }

    pub fn created(&mut self, item: T) {
        self.loading = false;
        self.items.push(item);
    }

    /// Replaces the stored item with the same id. Unknown ids are appended.
    pub fn updated(&mut self, item: T) {
        self.loading = false;
        match self.items.iter_mut().find(|i| i.id() == item.id()) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    pub fn deleted(&mut self, id: Uuid) {
        self.loading = false;
        self.items.retain(|i| i.id() != id);
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|i| i.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(Uuid, &'static str);

    impl Identified for Item {
        fn id(&self) -> Uuid {
            self.0
        }
    }

    #[test]
    fn test_delete_removes_only_that_id() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut state = ResourceState::default();
        state.loaded(vec![Item(a, "a"), Item(b, "b"), Item(c, "c")]);
        state.deleted(b);
        assert_eq!(state.items, vec![Item(a, "a"), Item(c, "c")]);
    }

    #[test]
    fn test_pending_then_rejected() {
        let mut state: ResourceState<Item> = ResourceState::default();
        state.pending();
        assert!(state.loading);
        state.rejected("Network down");
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Network down"));
        state.pending();
        assert!(state.error.is_none());
    }

    #[test]
    fn test_update_replaces_in_place() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut state = ResourceState::default();
        state.loaded(vec![Item(a, "a"), Item(b, "b")]);
        state.updated(Item(a, "a2"));
        assert_eq!(state.items[0], Item(a, "a2"));
        assert_eq!(state.get(b), Some(&Item(b, "b")));
    }
}
