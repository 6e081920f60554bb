use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::foundation::core::{Color, SlotId, StageId, Viewport};
use crate::foundation::error::GloperateResult;
use crate::foundation::variant::{TypeTag, Variant};
use crate::rendering::framebuffer::FramebufferHandle;
use crate::rendering::texture::TextureHandle;

/// Handle to a registered change listener, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription(u64);

/// Ordered observer list with deferred reentrancy.
///
/// Listeners fire in registration order. An emission requested while the
/// same event is mid-dispatch is queued and delivered after the current
/// pass finishes, so invalidation chains cannot recurse unboundedly
/// through one dispatcher.
pub(crate) struct Event<T> {
    listeners: RefCell<SmallVec<[(u64, Rc<dyn Fn(&T)>); 2]>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    deferred: RefCell<VecDeque<T>>,
}

impl<T: Clone> Event<T> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RefCell::new(SmallVec::new()),
            next_id: Cell::new(0),
            dispatching: Cell::new(false),
            deferred: RefCell::new(VecDeque::new()),
        }
    }

    pub(crate) fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription(id)
    }

    pub(crate) fn unsubscribe(&self, subscription: Subscription) {
        self.listeners
            .borrow_mut()
            .retain(|(id, _)| *id != subscription.0);
    }

    pub(crate) fn emit(&self, value: &T) {
        if self.dispatching.get() {
            self.deferred.borrow_mut().push_back(value.clone());
            return;
        }
        self.dispatching.set(true);
        let mut current = value.clone();
        loop {
            // Snapshot so listeners may subscribe/unsubscribe mid-pass.
            let pass: SmallVec<[(u64, Rc<dyn Fn(&T)>); 2]> = self.listeners.borrow().clone();
            for (_, listener) in &pass {
                listener(&current);
            }
            let next = self.deferred.borrow_mut().pop_front();
            match next {
                Some(value) => current = value,
                None => break,
            }
        }
        self.dispatching.set(false);
    }
}

/// Whether a slot feeds into or out of its stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum SlotDirection {
    /// Slot consumed by the stage.
    Input,
    /// Slot produced by the stage.
    Output,
}

/// Shared payload cell behind [`Input`](crate::Input) and
/// [`Output`](crate::Output): value, validity flag and change event.
pub(crate) struct SlotCell<T: SlotValue> {
    pub(crate) id: SlotId,
    pub(crate) name: String,
    pub(crate) owner: StageId,
    pub(crate) direction: SlotDirection,
    pub(crate) value: RefCell<T>,
    pub(crate) valid: Cell<bool>,
    pub(crate) changed: Event<T>,
}

impl<T: SlotValue> SlotCell<T> {
    pub(crate) fn new(
        id: SlotId,
        name: &str,
        owner: StageId,
        direction: SlotDirection,
        value: T,
        valid: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            id,
            name: name.to_string(),
            owner,
            direction,
            value: RefCell::new(value),
            valid: Cell::new(valid),
            changed: Event::new(),
        })
    }
}

/// Subscription of one slot to another slot's change event; dropping the
/// link unsubscribes.
pub(crate) struct Link<T: SlotValue> {
    pub(crate) source: Rc<SlotCell<T>>,
    pub(crate) subscription: Subscription,
}

impl<T: SlotValue> Drop for Link<T> {
    fn drop(&mut self) {
        self.source.changed.unsubscribe(self.subscription);
    }
}

/// Payload types a slot can carry.
///
/// Scriptable payloads map to and from [`Variant`]; opaque handle types
/// keep the defaults and are only reachable through typed slot accessors.
pub trait SlotValue: Clone + PartialEq + std::fmt::Debug + 'static {
    /// Coarse type of the payload, for inspection and mismatch reports.
    fn type_tag() -> TypeTag;

    /// The payload as a [`Variant`]; [`Variant::Null`] if unrepresentable.
    fn to_variant(&self) -> Variant {
        Variant::Null
    }

    /// Parse the payload from a [`Variant`]; `None` if unrepresentable.
    fn from_variant(_value: &Variant) -> Option<Self> {
        None
    }
}

impl SlotValue for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Bool
    }

    fn to_variant(&self) -> Variant {
        Variant::Bool(*self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_bool()
    }
}

impl SlotValue for i64 {
    fn type_tag() -> TypeTag {
        TypeTag::Int
    }

    fn to_variant(&self) -> Variant {
        Variant::Int(*self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_i64()
    }
}

impl SlotValue for u64 {
    fn type_tag() -> TypeTag {
        TypeTag::Int
    }

    fn to_variant(&self) -> Variant {
        Variant::Int(i64::try_from(*self).unwrap_or(i64::MAX))
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_i64().and_then(|i| u64::try_from(i).ok())
    }
}

impl SlotValue for f32 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn to_variant(&self) -> Variant {
        Variant::Float(f64::from(*self))
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_f64().map(|f| f as f32)
    }
}

impl SlotValue for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn to_variant(&self) -> Variant {
        Variant::Float(*self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_f64()
    }
}

impl SlotValue for String {
    fn type_tag() -> TypeTag {
        TypeTag::Str
    }

    fn to_variant(&self) -> Variant {
        Variant::Str(self.clone())
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl SlotValue for Viewport {
    fn type_tag() -> TypeTag {
        TypeTag::Viewport
    }

    fn to_variant(&self) -> Variant {
        Variant::List(vec![
            Variant::Float(self.x),
            Variant::Float(self.y),
            Variant::Float(self.width),
            Variant::Float(self.height),
        ])
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        match value.as_list() {
            Some([x, y, w, h]) => Some(Viewport::new(
                x.as_f64()?,
                y.as_f64()?,
                w.as_f64()?,
                h.as_f64()?,
            )),
            _ => None,
        }
    }
}

impl SlotValue for Color {
    fn type_tag() -> TypeTag {
        TypeTag::Color
    }

    fn to_variant(&self) -> Variant {
        Variant::List(vec![
            Variant::Float(f64::from(self.r)),
            Variant::Float(f64::from(self.g)),
            Variant::Float(f64::from(self.b)),
        ])
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        match value.as_list() {
            Some([r, g, b]) => Some(Color::new(
                r.as_f64()? as f32,
                g.as_f64()? as f32,
                b.as_f64()? as f32,
            )),
            _ => None,
        }
    }
}

impl SlotValue for TextureHandle {
    fn type_tag() -> TypeTag {
        TypeTag::Texture
    }
}

impl SlotValue for FramebufferHandle {
    fn type_tag() -> TypeTag {
        TypeTag::Framebuffer
    }
}

/// Type-erased view of a slot: the reflective capability every slot
/// implements, plus the operations the scheduler needs.
///
/// [`Input`](crate::Input) and [`Output`](crate::Output) both implement
/// this; stages expose their slots through it in declaration order.
pub trait AbstractSlot {
    /// Slot name, unique within its owning stage.
    fn name(&self) -> &str;

    /// Unique slot identity.
    fn slot_id(&self) -> SlotId;

    /// Identity of the owning stage.
    fn owner(&self) -> StageId;

    /// Whether this is an input or an output.
    fn direction(&self) -> SlotDirection;

    /// Coarse payload type.
    fn type_tag(&self) -> TypeTag;

    /// Current validity of the effective value.
    fn is_valid(&self) -> bool;

    /// Whether the scheduler must keep this slot recomputed (outputs only).
    fn is_required(&self) -> bool {
        false
    }

    /// Current effective value as a [`Variant`].
    fn get_variant(&self) -> Variant;

    /// Assign the value from a [`Variant`]; fails for payloads without a
    /// scripting representation.
    fn set_variant(&self, value: &Variant) -> GloperateResult<()>;

    /// Owner of the slot this one is bound to, if bound.
    fn source_stage(&self) -> Option<StageId> {
        None
    }

    /// Bind this slot to `source` (inputs only); the payload types must
    /// match.
    fn connect_from(&self, source: &dyn AbstractSlot) -> GloperateResult<()>;

    /// Mirror `source` on this slot (pass-through outputs only).
    fn forward_from(&self, source: &dyn AbstractSlot) -> GloperateResult<()>;

    /// Drop this slot's binding, if any.
    fn disconnect(&self);

    /// Mark the slot stale (outputs; no-op for inputs).
    fn invalidate(&self);

    /// The slot as [`Any`], for typed downcasts on dynamic connects.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/slot.rs"]
mod tests;
