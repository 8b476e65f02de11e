use std::iter::FusedIterator;

use crate::transaction::Transaction;

#[derive(Debug)]
struct Entry {
    tx: Transaction,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked list of committed transactions, in commit order.
///
/// Entries are kept in an arena and linked by index; removed slots are reused.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: Vec<Option<Entry>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl TransactionLog {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, tx: Transaction) {
        let entry = Entry {
            tx,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.entries[idx] = Some(entry);
                idx
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };
        match self.tail {
            Some(tail) => self.entry_mut(tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// Unlinks the first transaction with the given id.
    pub fn remove(&mut self, id: &str) -> Option<Transaction> {
        let mut current = self.head;
        while let Some(idx) = current {
            let entry = self.entry(idx);
            if entry.tx.id() == id {
                break;
            }
            current = entry.next;
        }
        let idx = current?;
        let entry = self.entries[idx].take()?;

        match entry.prev {
            Some(prev) => self.entry_mut(prev).next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => self.entry_mut(next).prev = entry.prev,
            None => self.tail = entry.prev,
        }
        self.free.push(idx);
        self.len -= 1;
        Some(entry.tx)
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.iter().find(|tx| tx.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Head to tail; use `.rev()` to walk from the latest commit backwards.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            log: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn entry(&self, idx: usize) -> &Entry {
        self.entries[idx]
            .as_ref()
            .expect("list links only point at live entries")
    }

    fn entry_mut(&mut self, idx: usize) -> &mut Entry {
        self.entries[idx]
            .as_mut()
            .expect("list links only point at live entries")
    }
}

pub struct Iter<'a> {
    log: &'a TransactionLog,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.log.entry(self.front?);
        self.front = entry.next;
        self.remaining -= 1;
        Some(&entry.tx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.log.entry(self.back?);
        self.back = entry.prev;
        self.remaining -= 1;
        Some(&entry.tx)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a TransactionLog {
    type Item = &'a Transaction;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
