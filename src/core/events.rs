//! # Event Channel Module / 事件通道模块
//!
//! A minimal, single-threaded observer registry. Anyone holding an
//! [`EventSource`] may subscribe and unsubscribe; only code inside this crate
//! can fire it, which keeps the status board the single writer.
//!
//! 一个最小化的单线程观察者注册表。持有 [`EventSource`] 的任何人都可以订阅和取消订阅；
//! 只有本 crate 内部的代码可以触发事件，从而保证状态板是唯一的写入者。

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`EventSource::subscribe`], used to unsubscribe later.
/// 由 [`EventSource::subscribe`] 返回的句柄，用于之后取消订阅。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

/// A one-to-many notification channel carrying values of type `T`.
pub struct EventSource<T> {
    listeners: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: Cell<u64>,
}

impl<T> EventSource<T> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers `callback`. Callbacks run synchronously, in registration order.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Removes a subscription. Returns `false` if the handle was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `value` to every current subscriber.
    ///
    /// The listener list is copied first so a callback may subscribe or
    /// unsubscribe without tripping the borrow; such changes take effect on
    /// the next fire.
    pub(crate) fn fire(&self, value: &T) {
        let listeners: Vec<Callback<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in listeners {
            callback(value);
        }
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}
