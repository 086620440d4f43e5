//! Ordered, append-only callback lists

use converge::Resource;
use std::fmt;
use std::sync::Arc;

/// A callback run around a resource's convergence
///
/// Callbacks receive the resource being converged. Returning an error aborts
/// the convergence run.
pub type Callback = Arc<dyn Fn(&dyn Resource) -> anyhow::Result<()>>;

/// Callbacks invoked in registration order
///
/// Cloning a sequence is cheap and yields a snapshot: callbacks registered on
/// the original afterwards do not show up in the clone.
#[derive(Clone, Default)]
pub struct CallbackSequence {
    callbacks: Vec<Callback>,
}

impl CallbackSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback
    pub fn register<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&dyn Resource) -> anyhow::Result<()> + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }

    /// All callbacks, in registration order
    pub fn all(&self) -> &[Callback] {
        &self.callbacks
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Check if no callback is registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invoke every callback with `resource`, stopping at the first error
    pub fn run(&self, resource: &dyn Resource) -> anyhow::Result<()> {
        for callback in &self.callbacks {
            callback(resource)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CallbackSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSequence")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Probe;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut sequence = CallbackSequence::new();
        for n in 0..3 {
            let order = Rc::clone(&order);
            sequence.register(move |_: &dyn Resource| {
                order.borrow_mut().push(n);
                Ok(())
            });
        }

        sequence.run(&Probe::new("file", "/tmp/a")).unwrap();

        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    fn test_empty_sequence_is_noop() {
        let sequence = CallbackSequence::new();
        assert!(sequence.is_empty());
        sequence.run(&Probe::new("file", "/tmp/a")).unwrap();
    }

    #[test]
    fn test_run_stops_at_first_error() {
        let reached = Rc::new(RefCell::new(false));
        let reached_clone = Rc::clone(&reached);
        let mut sequence = CallbackSequence::new();
        sequence
            .register(|resource: &dyn Resource| anyhow::bail!("{} is locked", resource.id()))
            .register(move |_: &dyn Resource| {
                *reached_clone.borrow_mut() = true;
                Ok(())
            });

        let err = sequence.run(&Probe::new("file", "/tmp/a")).unwrap_err();

        assert_eq!(err.to_string(), "file[/tmp/a] is locked");
        assert!(!*reached.borrow());
    }

    #[test]
    fn test_clone_is_a_snapshot() {
        let mut sequence = CallbackSequence::new();
        sequence.register(|_: &dyn Resource| Ok(()));
        let snapshot = sequence.clone();
        sequence.register(|_: &dyn Resource| Ok(()));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(sequence.len(), 2);
    }
}
