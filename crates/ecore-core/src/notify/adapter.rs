use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{EventType, Notification};
use crate::object::{e_contents, EObjectRef};

/// Receives the notifications of the objects it is attached to.
pub trait Adapter {
    fn notify_changed(&self, notification: &Notification);

    /// Called once the adapter has been added to `target`.
    fn set_target(&self, _target: &EObjectRef) {}

    /// Called once the adapter has been removed from `target`.
    fn unset_target(&self, _target: &EObjectRef) {}
}

pub type AdapterRef = Rc<dyn Adapter>;

pub(crate) fn same_adapter(a: &AdapterRef, b: &AdapterRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Keeps every notification it receives, in delivery order.
#[derive(Default)]
pub struct NotificationRecorder {
    notifications: RefCell<Vec<Notification>>,
}

impl NotificationRecorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Drains the recorded notifications.
    pub fn take(&self) -> Vec<Notification> {
        self.notifications.take()
    }

    pub fn len(&self) -> usize {
        self.notifications.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.borrow().is_empty()
    }
}

impl Adapter for NotificationRecorder {
    fn notify_changed(&self, notification: &Notification) {
        self.notifications.borrow_mut().push(notification.clone());
    }
}

/// Adapter that spreads itself over a whole containment tree.
///
/// Attaching it to an object also attaches it to everything that object
/// contains; children added later are picked up and removed children are
/// released. Every notification from the tree reaches the handler.
pub struct ContentAdapter {
    this: Weak<ContentAdapter>,
    handler: Box<dyn Fn(&Notification)>,
}

impl ContentAdapter {
    pub fn new(handler: impl Fn(&Notification) + 'static) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            handler: Box::new(handler),
        })
    }

    fn handle(&self) -> Option<AdapterRef> {
        self.this.upgrade().map(|rc| rc as AdapterRef)
    }

    fn attach(&self, object: &EObjectRef) {
        let Some(me) = self.handle() else { return };
        if !object.e_adapters().iter().any(|a| same_adapter(a, &me)) {
            object.e_add_adapter(me);
        }
    }

    fn detach(&self, object: &EObjectRef) {
        if let Some(me) = self.handle() {
            object.e_remove_adapter(&me);
        }
    }

    fn follow_containment(&self, notification: &Notification) {
        match notification.event_type() {
            EventType::Set | EventType::Unset | EventType::Resolve => {
                for old in notification.old_value().objects() {
                    self.detach(&old);
                }
                for new in notification.new_value().objects() {
                    self.attach(&new);
                }
            }
            EventType::Add | EventType::AddMany => {
                for new in notification.new_value().objects() {
                    self.attach(&new);
                }
            }
            EventType::Remove | EventType::RemoveMany => {
                for old in notification.old_value().objects() {
                    self.detach(&old);
                }
            }
            EventType::Move => {}
        }
    }
}

impl Adapter for ContentAdapter {
    fn notify_changed(&self, notification: &Notification) {
        if notification.feature().is_some_and(|f| f.is_containment()) {
            self.follow_containment(notification);
        }
        (self.handler)(notification);
    }

    fn set_target(&self, target: &EObjectRef) {
        for child in e_contents(target) {
            self.attach(&child);
        }
    }

    fn unset_target(&self, target: &EObjectRef) {
        for child in e_contents(target) {
            self.detach(&child);
        }
    }
}
