// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use tracing::info;

pub type TotalCallback = Box<dyn FnMut(f64)>;

/// Delivers settled grand totals to an external consumer, at most once per
/// distinct value.
#[derive(Default)]
pub struct ChangeNotifier {
    callback: Option<TotalCallback>,
    last: Option<f64>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("attached", &self.callback.is_some())
            .field("last", &self.last)
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the consumer.  The new consumer has seen nothing yet, so
    /// the next settled total reaches it regardless of earlier deliveries.
    pub fn attach(&mut self, callback: TotalCallback) {
        self.callback = Some(callback);
        self.last = None;
    }

    pub fn detach(&mut self) {
        self.callback = None;
        self.last = None;
    }

    pub fn is_attached(&self) -> bool {
        self.callback.is_some()
    }

    /// The last total handed to the consumer.
    pub fn last_delivered(&self) -> Option<f64> {
        self.last
    }

    /// Hands `total` to the consumer unless it equals the last delivered
    /// value.  Returns whether the callback ran.
    pub fn notify(&mut self, total: f64) -> bool {
        let Some(callback) = self.callback.as_mut() else {
            return false;
        };
        // totals are recomputed from scratch, so equal inputs give equal bits
        if self.last == Some(total) {
            return false;
        }
        info!(total, previous = ?self.last, "grand total changed");
        self.last = Some(total);
        callback(total);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (ChangeNotifier, Rc<RefCell<Vec<f64>>>) {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut notifier = ChangeNotifier::new();
        let sink = seen.clone();
        notifier.attach(Box::new(move |total| sink.borrow_mut().push(total)));
        (notifier, seen)
    }

    #[test]
    fn first_total_is_delivered() {
        let (mut notifier, seen) = recording();
        assert!(notifier.notify(0.0));
        assert_eq!(*seen.borrow(), vec![0.0]);
    }

    #[test]
    fn repeated_totals_are_suppressed() {
        let (mut notifier, seen) = recording();
        assert!(notifier.notify(5.0));
        assert!(!notifier.notify(5.0));
        assert!(notifier.notify(7.5));
        assert!(!notifier.notify(7.5));
        assert!(notifier.notify(5.0));
        assert_eq!(*seen.borrow(), vec![5.0, 7.5, 5.0]);
        assert_eq!(notifier.last_delivered(), Some(5.0));
    }

    #[test]
    fn one_ulp_is_a_change() {
        let (mut notifier, seen) = recording();
        let total: f64 = 0.4397;
        let next = f64::from_bits(total.to_bits() + 1);
        assert!(notifier.notify(total));
        assert!(notifier.notify(next));
        assert_eq!(*seen.borrow(), vec![total, next]);
        assert_eq!(notifier.last_delivered(), Some(next));
    }

    #[test]
    fn detached_notifier_delivers_nothing() {
        let mut notifier = ChangeNotifier::new();
        assert!(!notifier.notify(1.0));
        assert_eq!(notifier.last_delivered(), None);
        assert!(!notifier.is_attached());
    }

    #[test]
    fn reattaching_resets_dedup() {
        let (mut notifier, _) = recording();
        notifier.notify(3.0);

        let seen = Rc::new(RefCell::new(vec![]));
        let sink = seen.clone();
        notifier.attach(Box::new(move |t| sink.borrow_mut().push(t)));
        assert!(notifier.notify(3.0));
        assert_eq!(*seen.borrow(), vec![3.0]);
    }
}
