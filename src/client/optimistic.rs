//! Locally cached lists that apply a change before the server confirms it.
//!
//! Every mutation returns a [`Snapshot`] of the list as it was. The caller
//! either confirms with the server's record or hands the snapshot back to
//! [`OptimisticList::rollback`].

use uuid::Uuid;

use crate::comments::dto::CommentView;
use crate::questions::dto::QuestionView;

pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for QuestionView {
    fn key(&self) -> Uuid {
        self.question.id
    }
}

impl Keyed for CommentView {
    fn key(&self) -> Uuid {
        self.comment.id
    }
}

#[derive(Debug, Clone)]
#[must_use = "keep the snapshot to roll back a rejected change"]
pub struct Snapshot<T> {
    items: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    items: Vec<T>,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> OptimisticList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: Uuid) -> Option<&T> {
        self.items.iter().find(|i| i.key() == key)
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            items: self.items.clone(),
        }
    }

    pub fn insert_front(&mut self, item: T) -> Snapshot<T> {
        let snap = self.snapshot();
        self.items.insert(0, item);
        snap
    }

    /// `None` when no item has that key.
    pub fn remove(&mut self, key: Uuid) -> Option<Snapshot<T>> {
        let pos = self.items.iter().position(|i| i.key() == key)?;
        let snap = self.snapshot();
        self.items.remove(pos);
        Some(snap)
    }

    pub fn modify(&mut self, key: Uuid, f: impl FnOnce(&mut T)) -> Option<Snapshot<T>> {
        let pos = self.items.iter().position(|i| i.key() == key)?;
        let snap = self.snapshot();
        f(&mut self.items[pos]);
        Some(snap)
    }

    /// Swaps the local item for the server's record with the same key.
    pub fn confirm(&mut self, item: T) {
        let key = item.key();
        self.confirm_replace(key, item);
    }

    /// Swaps the item keyed `local_key` (e.g. a placeholder) for `item`.
    pub fn confirm_replace(&mut self, local_key: Uuid, item: T) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.key() == local_key) {
            *slot = item;
        }
    }

    pub fn rollback(&mut self, snapshot: Snapshot<T>) {
        self.items = snapshot.items;
    }
}
