//! Snapshot-coupled queue iteration.

use crate::error::{Error, Result};
use crate::queue::view::ReadView;
use crate::queue::PersistentQueue;
use crate::wire::Element;

/// An iterator over the enqueued records of a [`PersistentQueue`].
///
/// The head and tail cursors are captured under the read lock when the
/// iterator is created; every call to [`next`](Iterator::next)
/// re-acquires the read lock and re-validates them. Any enqueue,
/// dequeue or clear in between makes the next call yield
/// [`Error::ConcurrentModification`] — elements already yielded remain
/// valid. Iteration never consumes from the queue.
pub struct Iter<'a, E> {
    queue: &'a PersistentQueue<E>,
    head: i32,
    tail: i32,
    position: i32,
}

impl<'a, E: Element> Iter<'a, E> {
    pub(super) fn new(queue: &'a PersistentQueue<E>, head: i32, tail: i32, empty: bool) -> Self {
        Self {
            queue,
            head,
            tail,
            // An empty queue may hold head and tail at positions that
            // are only equal modulo the ring wrap; start at the tail so
            // iteration ends immediately.
            position: if empty { tail } else { head },
        }
    }

    /// Whether the iterator's cursor has reached the captured tail.
    pub fn has_next(&self) -> bool {
        self.position != self.tail
    }
}

impl<'a, E: Element> Iterator for Iter<'a, E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.tail {
            return None;
        }

        let inner = self.queue.inner.read();

        if inner.head != self.head || inner.tail != self.tail {
            return Some(Err(Error::ConcurrentModification));
        }

        let geometry = self.queue.geometry;
        let mut view = ReadView::new(&inner.map[..], geometry.first_usable_block as usize);

        // The previous record ended exactly at the file end; the next
        // one resumed at the ring start, just as the writer did.
        let at = if self.position == geometry.file_size {
            geometry.first_usable_block
        } else {
            self.position
        };

        view.set_position(at as usize);

        let size = view.get_i32();

        if let Err(error) = self.queue.validate_record_len(size) {
            return Some(Err(error));
        }

        let payload = view.read_wrapping(size as usize);

        // The view's cursor has physically wrapped if the payload did,
        // so normalizing it lands on the next record — or parks at the
        // file end, exactly where a parked tail will match it.
        self.position = geometry.normalize(view.position() as i32);

        Some(E::decode(&payload).map_err(Error::from))
    }
}
