use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::{SlotId, StageId};
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::foundation::variant::{TypeTag, Variant};
use crate::pipeline::output::Output;
use crate::pipeline::slot::{
    AbstractSlot, Link, SlotCell, SlotDirection, SlotValue, Subscription,
};
use crate::pipeline::stage::{StageCore, StageShared};

/// Typed input slot of a stage.
///
/// An input either holds a locally-assigned value or is bound to exactly
/// one source slot (an upstream [`Output`], or an enclosing pipeline's
/// input). Rebinding replaces the previous binding. Any effective-value
/// change marks the owning stage for reprocessing and cascades staleness
/// to the stage's outputs.
pub struct Input<T: SlotValue> {
    shared: Rc<InputShared<T>>,
}

impl<T: SlotValue> Clone for Input<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

struct InputShared<T: SlotValue> {
    cell: Rc<SlotCell<T>>,
    link: RefCell<Option<Link<T>>>,
    stage: Rc<StageShared>,
}

impl<T: SlotValue> InputShared<T> {
    fn on_source_event(&self, value: &T) {
        self.stage.on_input_changed();
        self.cell.changed.emit(value);
    }
}

impl<T: SlotValue> Input<T> {
    /// Create an input named `name` on `core`, holding `value` locally.
    pub fn new(core: &StageCore, name: &str, value: T) -> Self {
        let cell = SlotCell::new(
            SlotId(core.environment().next_id()),
            name,
            core.id(),
            SlotDirection::Input,
            value,
            true,
        );
        let input = Self {
            shared: Rc::new(InputShared {
                cell,
                link: RefCell::new(None),
                stage: Rc::clone(&core.shared),
            }),
        };
        core.register_slot(Rc::new(input.clone()));
        input
    }

    /// The current effective value.
    ///
    /// A bound input returns the source's current payload whether or not
    /// the source is valid; staleness is a separate property queried via
    /// [`is_valid`](Input::is_valid), and callers gating expensive
    /// recomputation must check it before trusting freshness.
    pub fn get(&self) -> T {
        match &*self.shared.link.borrow() {
            Some(link) => link.source.value.borrow().clone(),
            None => self.shared.cell.value.borrow().clone(),
        }
    }

    /// Assign a local value.
    ///
    /// Ignored while bound to a source (the source stays the single point
    /// of truth). Fires the change notification only if the value differs.
    pub fn set(&self, value: T) {
        if self.shared.link.borrow().is_some() {
            tracing::debug!(
                slot = self.name(),
                "set on a connected input ignored; the bound source wins"
            );
            return;
        }
        let changed = {
            let mut stored = self.shared.cell.value.borrow_mut();
            if *stored == value {
                false
            } else {
                *stored = value;
                true
            }
        };
        if changed {
            let current = self.shared.cell.value.borrow().clone();
            self.shared.stage.on_input_changed();
            self.shared.cell.changed.emit(&current);
        }
    }

    /// Validity of the effective value: a bound input mirrors its source,
    /// a local value is always valid.
    pub fn is_valid(&self) -> bool {
        match &*self.shared.link.borrow() {
            Some(link) => link.source.valid.get(),
            None => true,
        }
    }

    /// Whether the input is bound to a source slot.
    pub fn is_connected(&self) -> bool {
        self.shared.link.borrow().is_some()
    }

    /// Bind this input to an upstream output. Replaces any previous
    /// binding; fires the change notification exactly once if the
    /// effective value differs.
    pub fn connect_to(&self, source: &Output<T>) {
        self.bind_cell(source.cell_rc());
    }

    /// Register a listener on the change notification; fires on every
    /// effective-value change and on source invalidation.
    pub fn on_changed(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        self.shared.cell.changed.subscribe(listener)
    }

    /// Remove a listener registered with [`on_changed`](Input::on_changed).
    pub fn remove_listener(&self, subscription: Subscription) {
        self.shared.cell.changed.unsubscribe(subscription);
    }

    fn bind_cell(&self, source: Rc<SlotCell<T>>) {
        let previous = self.get();
        // Dropping the old link unsubscribes from the old source.
        *self.shared.link.borrow_mut() = None;

        let weak = Rc::downgrade(&self.shared);
        let subscription = source.changed.subscribe(move |value| {
            if let Some(shared) = weak.upgrade() {
                shared.on_source_event(value);
            }
        });
        let source_valid = source.valid.get();
        let current = source.value.borrow().clone();
        *self.shared.link.borrow_mut() = Some(Link {
            source,
            subscription,
        });

        let value_changed = current != previous;
        if value_changed || !source_valid {
            self.shared.stage.on_input_changed();
        }
        if value_changed {
            self.shared.cell.changed.emit(&current);
        }
    }

    fn unbind(&self) {
        let previous = self.get();
        let link = self.shared.link.borrow_mut().take();
        if link.is_none() {
            return;
        }
        drop(link);
        let local = self.shared.cell.value.borrow().clone();
        if local != previous {
            self.shared.stage.on_input_changed();
            self.shared.cell.changed.emit(&local);
        }
    }

    pub(crate) fn cell_rc(&self) -> Rc<SlotCell<T>> {
        Rc::clone(&self.shared.cell)
    }
}

impl<T: SlotValue> AbstractSlot for Input<T> {
    fn name(&self) -> &str {
        &self.shared.cell.name
    }

    fn slot_id(&self) -> SlotId {
        self.shared.cell.id
    }

    fn owner(&self) -> StageId {
        self.shared.cell.owner
    }

    fn direction(&self) -> SlotDirection {
        SlotDirection::Input
    }

    fn type_tag(&self) -> TypeTag {
        T::type_tag()
    }

    fn is_valid(&self) -> bool {
        Input::is_valid(self)
    }

    fn get_variant(&self) -> Variant {
        self.get().to_variant()
    }

    fn set_variant(&self, value: &Variant) -> GloperateResult<()> {
        match T::from_variant(value) {
            Some(parsed) => {
                self.set(parsed);
                Ok(())
            }
            None => Err(GloperateError::type_mismatch(format!(
                "cannot assign {:?} to slot '{}' of type {:?}",
                value,
                self.name(),
                T::type_tag()
            ))),
        }
    }

    fn source_stage(&self) -> Option<StageId> {
        self.shared
            .link
            .borrow()
            .as_ref()
            .map(|link| link.source.owner)
    }

    fn connect_from(&self, source: &dyn AbstractSlot) -> GloperateResult<()> {
        if let Some(output) = source.as_any().downcast_ref::<Output<T>>() {
            self.bind_cell(output.cell_rc());
            return Ok(());
        }
        if let Some(input) = source.as_any().downcast_ref::<Input<T>>() {
            self.bind_cell(input.cell_rc());
            return Ok(());
        }
        Err(GloperateError::type_mismatch(format!(
            "cannot connect slot '{}' ({:?}) to slot '{}' ({:?})",
            source.name(),
            source.type_tag(),
            self.name(),
            T::type_tag()
        )))
    }

    fn forward_from(&self, _source: &dyn AbstractSlot) -> GloperateResult<()> {
        Err(GloperateError::configuration(format!(
            "slot '{}' is an input; only outputs forward",
            self.name()
        )))
    }

    fn disconnect(&self) {
        self.unbind();
    }

    fn invalidate(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/input.rs"]
mod tests;
