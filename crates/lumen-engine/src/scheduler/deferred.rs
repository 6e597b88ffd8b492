use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task<C> = Box<dyn FnOnce(&mut C)>;

/// Queue of work to run on the next event-loop turn.
///
/// Cloning yields another handle to the same queue, so tasks may post
/// follow-up tasks. Those are not run by the `run_pending` call that is
/// currently draining; they wait for the next turn. Posted tasks cannot be
/// cancelled, so a task touching a surface must check that it still exists.
pub struct Deferred<C> {
    queue: Rc<RefCell<VecDeque<Task<C>>>>,
}

impl<C> Deferred<C> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn post(&self, task: impl FnOnce(&mut C) + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Runs every task queued before this call, in posting order. Returns the
    /// number of tasks run.
    pub fn run_pending(&self, ctx: &mut C) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let n = batch.len();
        for task in batch {
            task(ctx);
        }
        n
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl<C> Clone for Deferred<C> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<C> Default for Deferred<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Deferred<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("pending", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_in_posting_order() {
        let d = Deferred::<Vec<u32>>::new();
        d.post(|v| v.push(1));
        d.post(|v| v.push(2));
        assert_eq!(d.len(), 2);

        let mut out = Vec::new();
        assert_eq!(d.run_pending(&mut out), 2);
        assert_eq!(out, vec![1, 2]);
        assert!(d.is_empty());
    }

    #[test]
    fn tasks_posted_while_running_wait_for_next_turn() {
        let d = Deferred::<Vec<u32>>::new();
        let handle = d.clone();
        d.post(move |v| {
            v.push(1);
            handle.post(|v| v.push(2));
        });

        let mut out = Vec::new();
        assert_eq!(d.run_pending(&mut out), 1);
        assert_eq!(out, vec![1]);
        assert_eq!(d.len(), 1);

        d.run_pending(&mut out);
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let d = Deferred::<()>::default();
        assert_eq!(d.run_pending(&mut ()), 0);
    }
}
