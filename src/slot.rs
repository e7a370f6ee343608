use crate::event::{Event, ABS_MT_TRACKING_ID, EV_ABS};
use std::collections::BTreeMap;

const NO_CONTACT: i32 = -1;

#[derive(Debug, Clone, Copy)]
struct CodeState {
    last: Event,
    updated: bool,
}

/// Last known event per code, each flagged as updated or not during the
/// current report cycle. Iteration is ordered by code.
#[derive(Debug, Clone, Default)]
pub struct CodeStates {
    states: BTreeMap<u16, CodeState>,
}

impl CodeStates {
    pub fn record(&mut self, event: Event) {
        self.states.insert(
            event.code,
            CodeState {
                last: event,
                updated: true,
            },
        );
    }

    fn seed(&mut self, event: Event) {
        self.states.insert(
            event.code,
            CodeState {
                last: event,
                updated: false,
            },
        );
    }

    pub fn value(&self, code: u16) -> Option<i32> {
        self.states.get(&code).map(|state| state.last.value)
    }

    pub fn is_updated(&self, code: u16) -> bool {
        self.states.get(&code).map_or(false, |state| state.updated)
    }

    pub fn any_updated(&self) -> bool {
        self.states.values().any(|state| state.updated)
    }

    /// Copies of every event that wasn't updated this cycle, flagged as
    /// extra. Clears all updated flags.
    pub fn take_non_updated(&mut self) -> Vec<Event> {
        let mut result = vec![];
        for state in self.states.values_mut() {
            if !state.updated {
                result.push(state.last.extra());
            }
            state.updated = false;
        }
        result
    }

    pub fn clear_updated(&mut self) {
        for state in self.states.values_mut() {
            state.updated = false;
        }
    }
}

/// State of one multitouch contact slot.
#[derive(Debug, Clone)]
pub struct Slot {
    id: i32,
    codes: CodeStates,
}

impl Slot {
    pub fn new(id: i32) -> Slot {
        let mut codes = CodeStates::default();
        codes.seed(Event::new(0.0, EV_ABS, ABS_MT_TRACKING_ID, NO_CONTACT).extra());
        Slot { id, codes }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn add_event(&mut self, event: Event) {
        self.codes.record(event);
    }

    #[cfg(test)]
    pub(crate) fn value(&self, code: u16) -> Option<i32> {
        self.codes.value(code)
    }

    pub fn is_updated(&self, code: u16) -> bool {
        self.codes.is_updated(code)
    }

    pub fn is_active(&self) -> bool {
        self.codes.value(ABS_MT_TRACKING_ID) != Some(NO_CONTACT)
    }

    /// The stale part of this contact, to be re-reported at the end of a
    /// cycle. Empty for inactive slots and for slots untouched this cycle.
    pub fn get_non_updated_events(&mut self) -> Vec<Event> {
        if !self.is_active() || !self.codes.any_updated() {
            self.codes.clear_updated();
            return vec![];
        }
        self.codes.take_non_updated()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT};

    fn abs(code: u16, value: i32) -> Event {
        Event::new(0.0, EV_ABS, code, value)
    }

    fn touching_slot() -> Slot {
        let mut slot = Slot::new(0);
        slot.add_event(abs(ABS_MT_TRACKING_ID, 5));
        slot.add_event(abs(ABS_MT_POSITION_X, 23));
        slot.add_event(abs(ABS_MT_POSITION_Y, 42));
        slot.get_non_updated_events();
        slot
    }

    #[test]
    fn starts_without_a_contact() {
        let slot = Slot::new(3);
        assert_eq!(slot.id(), 3);
        assert_eq!(slot.value(ABS_MT_TRACKING_ID), Some(-1));
        assert!(!slot.is_active());
    }

    mod get_non_updated_events {
        use super::*;

        #[test]
        fn reports_stale_codes_in_code_order() {
            let mut slot = touching_slot();
            slot.add_event(abs(ABS_MT_POSITION_X, 51));
            assert_eq!(
                slot.get_non_updated_events(),
                vec![abs(ABS_MT_POSITION_Y, 42), abs(ABS_MT_TRACKING_ID, 5)]
            );
        }

        #[test]
        fn flags_reported_events_as_extra() {
            let mut slot = touching_slot();
            slot.add_event(abs(ABS_MT_POSITION_X, 51));
            assert!(slot.get_non_updated_events().iter().all(|event| event.is_extra));
        }

        #[test]
        fn is_empty_when_called_twice() {
            let mut slot = touching_slot();
            slot.add_event(abs(ABS_MT_POSITION_X, 51));
            slot.get_non_updated_events();
            assert_eq!(slot.get_non_updated_events(), vec![]);
        }

        #[test]
        fn is_empty_for_untouched_slots() {
            let mut slot = touching_slot();
            assert_eq!(slot.get_non_updated_events(), vec![]);
        }

        #[test]
        fn is_empty_for_released_contacts() {
            let mut slot = touching_slot();
            slot.add_event(abs(ABS_MT_POSITION_X, 51));
            slot.add_event(abs(ABS_MT_POSITION_Y, 84));
            slot.add_event(abs(ABS_MT_TRACKING_ID, -1));
            assert_eq!(slot.get_non_updated_events(), vec![]);
            slot.add_event(abs(ABS_MT_SLOT, 0));
            assert_eq!(slot.get_non_updated_events(), vec![]);
        }

        #[test]
        fn resets_flags_of_released_contacts() {
            let mut slot = touching_slot();
            slot.add_event(abs(ABS_MT_TRACKING_ID, -1));
            slot.get_non_updated_events();
            slot.add_event(abs(ABS_MT_TRACKING_ID, 6));
            assert_eq!(
                slot.get_non_updated_events(),
                vec![abs(ABS_MT_POSITION_X, 23), abs(ABS_MT_POSITION_Y, 42)]
            );
        }
    }
}
