//! Intrusive open list sorted ascending by `total_cost`, linked through
//! `CellInfo::prev_open`/`next_open` rather than a separate heap
//! allocation.

use crate::pool::{CellInfoPool, InfoIndex};

#[derive(Default)]
pub struct OpenList {
    head: Option<InfoIndex>,
}

impl OpenList {
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Insert `idx` keeping the list sorted ascending by `total_cost`.
    /// `idx` must not already be linked.
    pub fn insert(&mut self, pool: &mut CellInfoPool, idx: InfoIndex) {
        pool.get_mut(idx).open = true;
        let cost = pool.get(idx).total_cost;

        let mut cursor = self.head;
        let mut prev: Option<InfoIndex> = None;
        while let Some(cur) = cursor {
            if pool.get(cur).total_cost > cost {
                break;
            }
            prev = Some(cur);
            cursor = pool.get(cur).next_open;
        }

        pool.get_mut(idx).prev_open = prev;
        pool.get_mut(idx).next_open = cursor;
        match prev {
            Some(p) => pool.get_mut(p).next_open = Some(idx),
            None => self.head = Some(idx),
        }
        if let Some(c) = cursor {
            pool.get_mut(c).prev_open = Some(idx);
        }
    }

    /// Remove `idx` from the list, wherever it sits (used when a better
    /// path to an already-open cell requires a re-sort).
    pub fn remove(&mut self, pool: &mut CellInfoPool, idx: InfoIndex) {
        let (prev, next) = {
            let info = pool.get(idx);
            (info.prev_open, info.next_open)
        };
        match prev {
            Some(p) => pool.get_mut(p).next_open = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            pool.get_mut(n).prev_open = prev;
        }
        let info = pool.get_mut(idx);
        info.prev_open = None;
        info.next_open = None;
        info.open = false;
    }

    /// Pop the lowest-cost node.
    pub fn pop_front(&mut self, pool: &mut CellInfoPool) -> Option<InfoIndex> {
        let head = self.head?;
        self.remove(pool, head);
        Some(head)
    }
}
