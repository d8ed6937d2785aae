use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::{ToastId, ToastRecord, ToastState};

/// Process-wide id source. Shared by every store so ids stay unique per session.
static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(0);

fn next_toast_id() -> ToastId {
    ToastId(NEXT_TOAST_ID.fetch_add(1, Ordering::SeqCst) + 1)
}

/// Ordered collection of active toasts. Oldest first, frontmost last.
#[derive(Debug)]
pub struct ToastStore<T> {
    records: Vec<ToastRecord<T>>,
}

impl<T> Default for ToastStore<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> ToastStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, content: T) -> ToastId {
        let id = next_toast_id();
        self.records.push(ToastRecord {
            id,
            content,
            state: ToastState::default(),
        });
        id
    }

    /// Remove the record with `id`. Returns the removed record, or `None` if it was already gone.
    pub fn remove(&mut self, id: ToastId) -> Option<ToastRecord<T>> {
        let pos = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(pos))
    }

    /// Empty the store in one step and return the ids that were present.
    pub fn clear(&mut self) -> Vec<ToastId> {
        self.records.drain(..).map(|r| r.id).collect()
    }

    pub fn get(&self, id: ToastId) -> Option<&ToastRecord<T>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: ToastId) -> Option<&mut ToastRecord<T>> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in insertion order.
    pub fn order(&self) -> Vec<ToastId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToastRecord<T>> {
        self.records.iter()
    }

    pub fn frontmost(&self) -> Option<&ToastRecord<T>> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_preserves_insertion_order() {
        let mut store = ToastStore::new();
        let ids: Vec<_> = ["a", "b", "c", "d"].into_iter().map(|c| store.add(c)).collect();
        assert_eq!(store.order(), ids);
        assert_eq!(store.frontmost().map(|r| r.id), ids.last().copied());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut store = ToastStore::new();
        let id = store.add("a");
        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut store = ToastStore::new();
        let first = store.add(1);
        let second = store.add(2);
        assert_eq!(store.clear(), vec![first, second]);
        let third = store.add(3);
        assert!(third > second);
    }

    #[test]
    fn ids_are_unique_across_stores() {
        let mut a = ToastStore::new();
        let mut b = ToastStore::new();
        let x = a.add(());
        let y = b.add(());
        assert_ne!(x, y);
    }

    #[test]
    fn created_order_tracks_id() {
        let mut store = ToastStore::new();
        let older = store.add("old");
        let newer = store.add("new");
        let older = store.get(older).unwrap().created_order();
        let newer = store.get(newer).unwrap().created_order();
        assert!(older < newer);
    }
}
