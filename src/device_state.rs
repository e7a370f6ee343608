use crate::event::Event;
use crate::slot::{CodeStates, Slot};
use std::collections::BTreeMap;

/// Carry-forward bookkeeping for a whole device: its multitouch slots plus
/// the device level absolute axes.
#[derive(Debug, Clone)]
pub struct DeviceState {
    slots: BTreeMap<i32, Slot>,
    current: i32,
    globals: CodeStates,
}

impl Default for DeviceState {
    fn default() -> DeviceState {
        DeviceState::new()
    }
}

impl DeviceState {
    pub fn new() -> DeviceState {
        let mut slots = BTreeMap::new();
        slots.insert(0, Slot::new(0));
        DeviceState {
            slots,
            current: 0,
            globals: CodeStates::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn current_slot_id(&self) -> i32 {
        self.current
    }

    pub fn current_slot(&mut self) -> &mut Slot {
        let current = self.current;
        self.slots.entry(current).or_insert_with(|| Slot::new(current))
    }

    /// Switches the current slot, creating it the first time it's selected.
    pub fn select_slot(&mut self, id: i32) -> &mut Slot {
        self.current = id;
        self.current_slot()
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, id: i32) -> Option<&Slot> {
        self.slots.get(&id)
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn add_event(&mut self, event: Event) {
        self.globals.record(event);
    }

    /// Stale device level axes, re-reported at every frame boundary.
    pub fn get_non_updated_events(&mut self) -> Vec<Event> {
        self.globals.take_non_updated()
    }
}
