use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::device::types::{Device, DeviceState};
use crate::dispatch::{Dispatcher, HandlerToken};
use crate::error::StoreError;
use crate::store::actions::Action;

/// Change notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Any registry or selection mutation.
    AnyChange,
    /// A state-machine transition.
    DeviceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerToken {
    channel: Channel,
    id: u64,
}

type Listener = Box<dyn FnMut()>;

struct Inner {
    devices: IndexMap<String, Device>,
    selected_uuid: Option<String>,
    state: DeviceState,
    // A slot holds None while its listener is being invoked.
    any_change: Vec<(u64, Option<Listener>)>,
    device_state: Vec<(u64, Option<Listener>)>,
    next_listener: u64,
}

impl Inner {
    fn listeners_mut(&mut self, channel: Channel) -> &mut Vec<(u64, Option<Listener>)> {
        match channel {
            Channel::AnyChange => &mut self.any_change,
            Channel::DeviceState => &mut self.device_state,
        }
    }
}

/// Single source of truth for the device registry, the selection, and the
/// device state machine. The only writer; driven exclusively by `Action`s
/// delivered through the dispatcher it is attached to. Consumers read
/// snapshots and subscribe per channel.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct DeviceStore {
    inner: Rc<RefCell<Inner>>,
}

impl DeviceStore {
    pub fn new() -> Self {
        DeviceStore {
            inner: Rc::new(RefCell::new(Inner {
                devices: IndexMap::new(),
                selected_uuid: None,
                state: DeviceState::NoDevice,
                any_change: Vec::new(),
                device_state: Vec::new(),
                next_listener: 0,
            })),
        }
    }

    /// Register this store's action handler on `dispatcher`.
    pub fn attach(&self, dispatcher: &Dispatcher<Action, StoreError>) -> HandlerToken {
        let store = self.clone();
        dispatcher.register(move |action| store.apply(action))
    }

    /// Snapshot of the registry in discovery order.
    pub fn devices(&self) -> Vec<Device> {
        self.inner.borrow().devices.values().cloned().collect()
    }

    pub fn selected_device(&self) -> Result<Device, StoreError> {
        let inner = self.inner.borrow();
        inner
            .selected_uuid
            .as_ref()
            .and_then(|uuid| inner.devices.get(uuid))
            .cloned()
            .ok_or(StoreError::NotSelected)
    }

    pub fn device_state(&self) -> DeviceState {
        self.inner.borrow().state
    }

    pub fn add_change_listener(&self, channel: Channel, listener: impl FnMut() + 'static) -> ListenerToken {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners_mut(channel).push((id, Some(Box::new(listener))));
        ListenerToken { channel, id }
    }

    pub fn remove_change_listener(&self, token: ListenerToken) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners_mut(token.channel).retain(|(id, _)| *id != token.id);
    }

    fn apply(&self, action: &Action) -> Result<(), StoreError> {
        match action {
            Action::DeviceFound { device } => {
                {
                    let mut inner = self.inner.borrow_mut();
                    let mut device = device.clone();
                    device.selected = false;
                    inner.devices.insert(device.uuid.clone(), device);
                }
                self.notify(Channel::AnyChange);
            },
            Action::ClearDevices => {
                {
                    let mut inner = self.inner.borrow_mut();
                    inner.devices.clear();
                    inner.selected_uuid = None;
                }
                // `state` is deliberately left alone: it answers "has a device
                // been selected this session", not "is the registry non-empty".
                self.notify(Channel::AnyChange);
            },
            Action::SelectDevice { uuid } => {
                {
                    let mut inner = self.inner.borrow_mut();
                    if !inner.devices.contains_key(uuid.as_str()) {
                        return Err(StoreError::UnknownDevice { uuid: uuid.clone() });
                    }

                    for device in inner.devices.values_mut() {
                        device.selected = device.uuid == *uuid;
                    }
                    inner.selected_uuid = Some(uuid.clone());
                    inner.state = DeviceState::DeviceSelected;
                }
                // Ordering is an observable contract: the device list has
                // settled before the state change is announced.
                self.notify(Channel::AnyChange);
                self.notify(Channel::DeviceState);
            },
            Action::DeviceReady => {
                {
                    let mut inner = self.inner.borrow_mut();
                    if inner.selected_uuid.is_none() {
                        return Err(StoreError::NotSelected);
                    }
                    inner.state = DeviceState::DeviceReady;
                }
                self.notify(Channel::DeviceState);
            },
        }

        Ok(())
    }

    fn notify(&self, channel: Channel) {
        // Snapshot the listener list; listeners added or removed during a
        // notification take effect for subsequent notifications.
        let ids: Vec<u64> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners_mut(channel).iter().map(|(id, _)| *id).collect()
        };

        for id in ids {
            let listener = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .listeners_mut(channel)
                    .iter_mut()
                    .find(|(i, _)| *i == id)
                    .and_then(|(_, slot)| slot.take())
            };

            let Some(mut listener) = listener else { continue };
            listener();

            let mut inner = self.inner.borrow_mut();
            if let Some((_, slot)) = inner
                .listeners_mut(channel)
                .iter_mut()
                .find(|(i, _)| *i == id)
            {
                *slot = Some(listener);
            }
        }
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
