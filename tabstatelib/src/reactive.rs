//! Observable stores and update batching.
//!
//! The derivation pipeline is push-based and single-threaded. Inputs (the
//! dataset, plugin state) live in [`Writable`] stores; every write bumps the
//! store's version and notifies its subscribers. Notifications are always
//! delivered through a batch: while a [`batch`] is open they are queued (one
//! entry per distinct callback, no matter how many stores it listens to) and
//! delivered when the outermost batch closes.
//!
//! Derived stages compare the versions of all their inputs at once, so a stage
//! recomputes at most once per delivered notification even when several of
//! its inputs changed together.
//!
//! Values are held behind an `Rc` and readers work on a snapshot of it, so a
//! closure passed to `with` may write to any store (including the one it is
//! reading). The closure keeps seeing the snapshot it was handed; the store
//! itself already holds the new value when the write returns.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::trace;

/// Identifies a subscription on a single store.
pub type SubscriptionId = u64;

/// A type-erased handle to a store, used to declare stage dependencies.
pub type Dependency = Rc<dyn Observable>;

/// Something whose changes can be observed.
///
/// Implemented by the shared interior of [`Writable`]/[`Readable`]; obtain one
/// through [`Writable::dependency`] or [`Readable::dependency`].
pub trait Observable {
    /// Monotonic change counter. Changes every time the value is replaced.
    fn version(&self) -> u64;

    /// Register a callback invoked after every change.
    fn subscribe_callback(&self, callback: Rc<dyn Fn()>) -> SubscriptionId;

    /// Remove a previously registered callback.
    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    callback: Rc<dyn Fn()>,
}

impl Subscriber {
    fn same_callback(&self, other: &Subscriber) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.callback) as *const (),
            Rc::as_ptr(&other.callback) as *const (),
        )
    }
}

#[derive(Default)]
struct Runtime {
    depth: Cell<usize>,
    pending: RefCell<Vec<Subscriber>>,
    next_id: Cell<SubscriptionId>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime::default();
}

fn next_subscription_id() -> SubscriptionId {
    RUNTIME.with(|rt| {
        let id = rt.next_id.get() + 1;
        rt.next_id.set(id);
        id
    })
}

/// Closes a batch level on drop, so a panicking closure does not leave the
/// runtime stuck in batching mode.
struct BatchGuard;

impl BatchGuard {
    fn open() -> Self {
        RUNTIME.with(|rt| rt.depth.set(rt.depth.get() + 1));
        BatchGuard
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let outermost = RUNTIME.with(|rt| {
            let depth = rt.depth.get().saturating_sub(1);
            rt.depth.set(depth);
            depth == 0
        });
        if outermost && !std::thread::panicking() {
            deliver_pending();
        } else if outermost {
            RUNTIME.with(|rt| rt.pending.borrow_mut().clear());
        }
    }
}

/// Run `f` with change notifications deferred until it returns.
///
/// Every callback subscribed to any store changed inside `f` runs exactly
/// once afterwards. Batches nest; only the outermost one delivers.
///
/// ```rust
/// use tabstatelib::reactive::{batch, Writable};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let a = Writable::new(1);
/// let b = Writable::new(2);
/// let runs = Rc::new(Cell::new(0));
/// let counter = runs.clone();
/// let callback: Rc<dyn Fn()> = Rc::new(move || counter.set(counter.get() + 1));
/// a.subscribe_callback(callback.clone());
/// b.subscribe_callback(callback);
///
/// batch(|| {
///     a.set(10);
///     b.set(20);
/// });
/// assert_eq!(runs.get(), 1);
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    let _guard = BatchGuard::open();
    f()
}

fn enqueue(subscribers: Vec<Subscriber>) {
    let _guard = BatchGuard::open();
    RUNTIME.with(|rt| {
        let mut pending = rt.pending.borrow_mut();
        for sub in subscribers {
            if !pending.iter().any(|p| p.same_callback(&sub)) {
                pending.push(sub);
            }
        }
    });
}

fn deliver_pending() {
    loop {
        let next = RUNTIME.with(|rt| {
            let mut pending = rt.pending.borrow_mut();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        });
        match next {
            Some(sub) => {
                trace!("delivering change notification to subscriber {}", sub.id);
                (sub.callback)();
            }
            None => break,
        }
    }
}

struct Store<T> {
    value: RefCell<Rc<T>>,
    version: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl<T> Store<T> {
    fn snapshot(&self) -> Rc<T> {
        Rc::clone(&self.value.borrow())
    }

    fn replace(&self, value: T) {
        let old = std::mem::replace(&mut *self.value.borrow_mut(), Rc::new(value));
        // Release the old value only after the borrow ends; its drop may run user code.
        drop(old);
        self.changed();
    }

    fn changed(&self) {
        self.version.set(self.version.get() + 1);
        let subscribers = self.subscribers.borrow().clone();
        if !subscribers.is_empty() {
            enqueue(subscribers);
        }
    }
}

impl<T> Observable for Store<T> {
    fn version(&self) -> u64 {
        self.version.get()
    }

    fn subscribe_callback(&self, callback: Rc<dyn Fn()>) -> SubscriptionId {
        let id = next_subscription_id();
        self.subscribers.borrow_mut().push(Subscriber { id, callback });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|s| s.id != id);
    }
}

/// A mutable observable value.
///
/// Cloning a `Writable` yields another handle to the same value.
pub struct Writable<T> {
    store: Rc<Store<T>>,
}

impl<T: 'static> Writable<T> {
    /// Create a store holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            store: Rc::new(Store {
                value: RefCell::new(Rc::new(value)),
                version: Cell::new(1),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.store.snapshot()).clone()
    }

    /// Shared handle to the current value.
    pub fn snapshot(&self) -> Rc<T> {
        self.store.snapshot()
    }

    /// Call `f` with the current value.
    ///
    /// `f` sees a snapshot: writes made from inside `f` (to this or any other
    /// store) take effect immediately but are not visible through the
    /// reference `f` was given.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.store.snapshot())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.store.replace(value);
    }

    /// Modify the value and notify subscribers.
    ///
    /// Modifies in place unless a reader still holds a snapshot, in which
    /// case the value is cloned first.
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        let mut value = self.store.snapshot();
        f(Rc::make_mut(&mut value));
        *self.store.value.borrow_mut() = value;
        self.store.changed();
    }

    /// Current version of the value.
    pub fn version(&self) -> u64 {
        self.store.version.get()
    }

    /// Call `f` after every change. See [`batch`] for delivery rules.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> SubscriptionId {
        self.store.subscribe_callback(Rc::new(f))
    }

    /// Register a shared callback; the same callback registered on several
    /// stores runs once per batch.
    pub fn subscribe_callback(&self, callback: Rc<dyn Fn()>) -> SubscriptionId {
        self.store.subscribe_callback(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }

    /// A read-only handle to the same value.
    pub fn readable(&self) -> Readable<T> {
        Readable {
            store: Rc::clone(&self.store),
        }
    }

    /// A type-erased handle for dependency tracking.
    pub fn dependency(&self) -> Dependency {
        self.store.clone()
    }
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
        }
    }
}

impl<T: Default + 'static> Default for Writable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writable")
            .field("version", &self.store.version.get())
            .field("value", &*self.store.snapshot())
            .finish()
    }
}

/// A read-only view of an observable value.
pub struct Readable<T> {
    store: Rc<Store<T>>,
}

impl<T: 'static> Readable<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.store.snapshot()).clone()
    }

    /// Shared handle to the current value.
    pub fn snapshot(&self) -> Rc<T> {
        self.store.snapshot()
    }

    /// Call `f` with a snapshot of the current value; see [`Writable::with`].
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.store.snapshot())
    }

    /// Current version of the value.
    pub fn version(&self) -> u64 {
        self.store.version.get()
    }

    /// Call `f` after every change.
    pub fn subscribe(&self, f: impl Fn() + 'static) -> SubscriptionId {
        self.store.subscribe_callback(Rc::new(f))
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }

    /// A type-erased handle for dependency tracking.
    pub fn dependency(&self) -> Dependency {
        self.store.clone()
    }
}

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Readable")
            .field("version", &self.store.version.get())
            .field("value", &*self.store.snapshot())
            .finish()
    }
}
