use std::collections::BTreeMap;

use cardsort_core::LockField;

use crate::capture::CaptureValues;

/// Sticky per-field values that pre-fill the next browse capture.
///
/// A slot can be locked to "nothing" (`None`), which keeps the field empty
/// instead of falling back to the catalog default. Locks live only as long as
/// the engine and are never read by session capture.
#[derive(Debug, Clone, Default)]
pub struct FieldLocks {
    slots: BTreeMap<LockField, Option<String>>,
}

impl FieldLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `field` to `current`, or unlock it if already locked.
    /// Returns whether the field is locked afterwards.
    pub fn toggle(&mut self, field: LockField, current: Option<&str>) -> bool {
        if self.slots.remove(&field).is_some() {
            return false;
        }
        let value = current.filter(|v| !v.is_empty()).map(str::to_string);
        self.slots.insert(field, value);
        true
    }

    pub fn resolve_initial(
        &self,
        field: LockField,
        catalog_default: Option<&str>,
    ) -> Option<String> {
        match self.slots.get(&field) {
            Some(locked) => locked.clone(),
            None => catalog_default.map(str::to_string),
        }
    }

    pub fn is_locked(&self, field: LockField) -> bool {
        self.slots.contains_key(&field)
    }

    /// The stored value of a locked field. `None` when unlocked or locked empty.
    pub fn value(&self, field: LockField) -> Option<&str> {
        self.slots.get(&field).and_then(|v| v.as_deref())
    }

    pub fn locked_fields(&self) -> Vec<LockField> {
        self.slots.keys().copied().collect()
    }

    pub fn unlock_all(&mut self) {
        self.slots.clear();
    }

    /// After a confirmed browse capture, every locked slot outside `keep` takes
    /// the value the user actually submitted.
    pub fn write_through(&mut self, values: &CaptureValues, keep: &[LockField]) {
        for (field, slot) in self.slots.iter_mut() {
            if keep.contains(field) {
                continue;
            }
            *slot = values.field_value(*field).map(str::to_string);
        }
    }
}
