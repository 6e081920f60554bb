use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::{SlotId, StageId};
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::foundation::variant::{TypeTag, Variant};
use crate::pipeline::slot::{
    AbstractSlot, Link, SlotCell, SlotDirection, SlotValue, Subscription,
};
use crate::pipeline::stage::StageCore;

/// Typed output slot of a stage.
///
/// An output starts stale; [`set`](Output::set) publishes a value and
/// marks it valid, [`invalidate`](Output::invalidate) marks it stale
/// while keeping the payload, so downstream consumers can fall back to
/// the last good value. Bound inputs observe both through the change
/// notification. Outputs hold no references to the inputs they feed;
/// the bindings live on the input side.
pub struct Output<T: SlotValue> {
    shared: Rc<OutputShared<T>>,
}

impl<T: SlotValue> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

struct OutputShared<T: SlotValue> {
    cell: Rc<SlotCell<T>>,
    required: Cell<bool>,
    forward: RefCell<Option<Link<T>>>,
}

impl<T: SlotValue> Output<T> {
    /// Create an output named `name` on `core`, stale until first set,
    /// with `value` as the initial payload.
    pub fn new(core: &StageCore, name: &str, value: T) -> Self {
        let cell = SlotCell::new(
            SlotId(core.environment().next_id()),
            name,
            core.id(),
            SlotDirection::Output,
            value,
            false,
        );
        let output = Self {
            shared: Rc::new(OutputShared {
                cell,
                required: Cell::new(false),
                forward: RefCell::new(None),
            }),
        };
        core.register_slot(Rc::new(output.clone()));
        output
    }

    /// The current payload, which may be stale; check
    /// [`is_valid`](Output::is_valid) before trusting freshness.
    pub fn get(&self) -> T {
        self.shared.cell.value.borrow().clone()
    }

    /// Publish a value: stores it, marks the output valid and fires the
    /// change notification to all bound inputs.
    pub fn set(&self, value: T) {
        *self.shared.cell.value.borrow_mut() = value.clone();
        self.shared.cell.valid.set(true);
        self.shared.cell.changed.emit(&value);
    }

    /// Mark the output stale without touching the payload.
    ///
    /// Fires the change notification (carrying the stale payload) on the
    /// valid-to-stale transition only; invalidating an already-stale
    /// output is a no-op, which bounds invalidation cascades.
    pub fn invalidate(&self) {
        if !self.shared.cell.valid.get() {
            return;
        }
        self.shared.cell.valid.set(false);
        let stale = self.shared.cell.value.borrow().clone();
        self.shared.cell.changed.emit(&stale);
    }

    /// Whether the payload is fresh.
    pub fn is_valid(&self) -> bool {
        self.shared.cell.valid.get()
    }

    /// Mark the output as required: the scheduler reprocesses the owning
    /// stage whenever a required output is stale, even with unchanged
    /// inputs.
    pub fn set_required(&self, required: bool) {
        self.shared.required.set(required);
    }

    /// Mirror `source` on this output: current value and validity are
    /// copied now, later sets and invalidations are forwarded. Used for
    /// pass-through outputs of nested pipelines.
    pub fn forward_from_output(&self, source: &Output<T>) {
        let source_cell = source.cell_rc();
        *self.shared.forward.borrow_mut() = None;

        let weak = Rc::downgrade(&self.shared);
        let subscription = source_cell.changed.subscribe(move |value| {
            if let Some(shared) = weak.upgrade() {
                let this = Output { shared };
                if this.forward_source_valid() {
                    this.set(value.clone());
                } else {
                    this.invalidate();
                }
            }
        });
        let valid = source_cell.valid.get();
        let current = source_cell.value.borrow().clone();
        *self.shared.forward.borrow_mut() = Some(Link {
            source: source_cell,
            subscription,
        });
        if valid {
            self.set(current);
        } else {
            *self.shared.cell.value.borrow_mut() = current;
            self.invalidate();
        }
    }

    /// Register a listener on the change notification; fires on every
    /// set and on the valid-to-stale transition.
    pub fn on_changed(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        self.shared.cell.changed.subscribe(listener)
    }

    /// Register a listener fired when the output turns stale. The host
    /// canvas uses this on the root `rendered` output to coalesce redraw
    /// requests.
    pub fn on_invalidated(&self, listener: impl Fn() + 'static) -> Subscription {
        let weak = Rc::downgrade(&self.shared);
        self.shared.cell.changed.subscribe(move |_| {
            if let Some(shared) = weak.upgrade() {
                if !shared.cell.valid.get() {
                    listener();
                }
            }
        })
    }

    /// Remove a listener registered on this output.
    pub fn remove_listener(&self, subscription: Subscription) {
        self.shared.cell.changed.unsubscribe(subscription);
    }

    fn forward_source_valid(&self) -> bool {
        self.shared
            .forward
            .borrow()
            .as_ref()
            .is_some_and(|link| link.source.valid.get())
    }

    pub(crate) fn cell_rc(&self) -> Rc<SlotCell<T>> {
        Rc::clone(&self.shared.cell)
    }
}

impl<T: SlotValue> AbstractSlot for Output<T> {
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
        SlotDirection::Output
    }

    fn type_tag(&self) -> TypeTag {
        T::type_tag()
    }

    fn is_valid(&self) -> bool {
        Output::is_valid(self)
    }

    fn is_required(&self) -> bool {
        self.shared.required.get()
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
            .forward
            .borrow()
            .as_ref()
            .map(|link| link.source.owner)
    }

    fn connect_from(&self, source: &dyn AbstractSlot) -> GloperateResult<()> {
        Err(GloperateError::configuration(format!(
            "slot '{}' is an output; connect targets must be inputs (source was '{}')",
            self.name(),
            source.name()
        )))
    }

    fn forward_from(&self, source: &dyn AbstractSlot) -> GloperateResult<()> {
        match source.as_any().downcast_ref::<Output<T>>() {
            Some(output) => {
                self.forward_from_output(output);
                Ok(())
            }
            None => Err(GloperateError::type_mismatch(format!(
                "cannot forward slot '{}' ({:?}) into output '{}' ({:?})",
                source.name(),
                source.type_tag(),
                self.name(),
                T::type_tag()
            ))),
        }
    }

    fn disconnect(&self) {
        *self.shared.forward.borrow_mut() = None;
    }

    fn invalidate(&self) {
        Output::invalidate(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/output.rs"]
mod tests;
