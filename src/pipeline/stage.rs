use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::core::StageId;
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::pipeline::slot::{AbstractSlot, SlotDirection};

/// State shared between a stage and its slots.
///
/// Inputs hold a handle to this so that any effective-value change can
/// mark the stage dirty and cascade staleness to the stage's outputs
/// without the stage being borrowed.
pub(crate) struct StageShared {
    pub(crate) id: StageId,
    pub(crate) name: String,
    pub(crate) dirty: Cell<bool>,
    pub(crate) context_initialized: Cell<bool>,
    invalidating: Cell<bool>,
    pub(crate) inputs: RefCell<Vec<Rc<dyn AbstractSlot>>>,
    pub(crate) outputs: RefCell<Vec<Rc<dyn AbstractSlot>>>,
}

impl StageShared {
    /// Called by inputs whenever their effective value changes or their
    /// source goes stale: schedules reprocessing and pushes staleness
    /// strictly downstream by invalidating all own outputs.
    pub(crate) fn on_input_changed(&self) {
        self.dirty.set(true);
        if self.invalidating.get() {
            // Already cascading; the outputs are stale by now.
            return;
        }
        self.invalidating.set(true);
        let outputs: Vec<Rc<dyn AbstractSlot>> = self.outputs.borrow().clone();
        for output in outputs {
            output.invalidate();
        }
        self.invalidating.set(false);
    }
}

/// Per-stage bookkeeping every [`Stage`] implementation embeds: identity,
/// slot registry in declaration order, dirty flag and context lifecycle
/// state.
pub struct StageCore {
    pub(crate) env: Environment,
    pub(crate) shared: Rc<StageShared>,
}

impl StageCore {
    /// Create the core for a stage named `name`.
    pub fn new(env: &Environment, name: &str) -> Self {
        Self {
            env: env.clone(),
            shared: Rc::new(StageShared {
                id: StageId(env.next_id()),
                name: name.to_string(),
                dirty: Cell::new(true),
                context_initialized: Cell::new(false),
                invalidating: Cell::new(false),
                inputs: RefCell::new(Vec::new()),
                outputs: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The stage name, unique within the owning pipeline.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The stage identity.
    pub fn id(&self) -> StageId {
        self.shared.id
    }

    /// The environment this stage was created in.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Whether `on_context_init` ran for the current context.
    pub fn is_context_initialized(&self) -> bool {
        self.shared.context_initialized.get()
    }

    /// Input slots in declaration order.
    pub fn inputs(&self) -> Vec<Rc<dyn AbstractSlot>> {
        self.shared.inputs.borrow().clone()
    }

    /// Output slots in declaration order.
    pub fn outputs(&self) -> Vec<Rc<dyn AbstractSlot>> {
        self.shared.outputs.borrow().clone()
    }

    /// Find an input slot by name.
    pub fn find_input(&self, name: &str) -> Option<Rc<dyn AbstractSlot>> {
        self.shared
            .inputs
            .borrow()
            .iter()
            .find(|slot| slot.name() == name)
            .cloned()
    }

    /// Find an output slot by name.
    pub fn find_output(&self, name: &str) -> Option<Rc<dyn AbstractSlot>> {
        self.shared
            .outputs
            .borrow()
            .iter()
            .find(|slot| slot.name() == name)
            .cloned()
    }

    /// Find a slot of either direction by name.
    pub fn find_slot(&self, name: &str) -> Option<Rc<dyn AbstractSlot>> {
        self.find_input(name).or_else(|| self.find_output(name))
    }

    /// Whether the next `process` call would invoke `on_process`: an input
    /// changed or went stale, the stage never processed against the
    /// current context, or a required output is stale.
    pub fn needs_processing(&self) -> bool {
        if self.shared.dirty.get() {
            return true;
        }
        self.shared
            .outputs
            .borrow()
            .iter()
            .any(|output| output.is_required() && !output.is_valid())
    }

    pub(crate) fn register_slot(&self, slot: Rc<dyn AbstractSlot>) {
        match slot.direction() {
            SlotDirection::Input => self.shared.inputs.borrow_mut().push(slot),
            SlotDirection::Output => self.shared.outputs.borrow_mut().push(slot),
        }
    }
}

/// A named processing unit owning typed input and output slots.
///
/// Implementations provide [`on_process`](Stage::on_process) and the
/// optional context lifecycle hooks; the provided methods implement the
/// memoized processing contract: `on_process` runs only when an input
/// changed or went stale since the outputs were last computed, or when a
/// required output is stale.
pub trait Stage {
    /// The embedded per-stage bookkeeping.
    fn core(&self) -> &StageCore;

    /// Acquire context-scoped resources. Called once per context
    /// (re)creation, always before the first `on_process` against it.
    fn on_context_init(&mut self, _ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        Ok(())
    }

    /// Release context-scoped resources. Pending asynchronous work for
    /// this context must be abandoned by the time this returns.
    fn on_context_deinit(&mut self, _ctx: &mut dyn RenderContext) {}

    /// Recompute outputs from the current input values.
    fn on_process(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()>;

    /// Associate the stage with a rendering context; idempotent.
    fn init_context(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        if self.core().is_context_initialized() {
            return Ok(());
        }
        tracing::debug!(stage = self.core().name(), "init context");
        self.on_context_init(ctx)?;
        let shared = &self.core().shared;
        shared.context_initialized.set(true);
        shared.dirty.set(true);
        Ok(())
    }

    /// Release the stage's association with a rendering context;
    /// idempotent, a no-op for a stage that was never initialized.
    fn deinit_context(&mut self, ctx: &mut dyn RenderContext) {
        if !self.core().is_context_initialized() {
            return;
        }
        tracing::debug!(stage = self.core().name(), "deinit context");
        self.on_context_deinit(ctx);
        self.core().shared.context_initialized.set(false);
    }

    /// Whether the next `process` call would invoke `on_process`.
    fn needs_processing(&self) -> bool {
        self.core().needs_processing()
    }

    /// Process the stage if needed.
    ///
    /// Fails with a context error when called before `init_context`. A
    /// failing `on_process` leaves the dirty flag set and the outputs at
    /// their pre-failure validity, so a later frame retries.
    fn process(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        if !self.core().is_context_initialized() {
            return Err(GloperateError::context(format!(
                "stage '{}' processed without an initialized context",
                self.core().name()
            )));
        }
        if !self.needs_processing() {
            return Ok(());
        }
        self.on_process(ctx)?;
        self.core().shared.dirty.set(false);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/stage.rs"]
mod tests;
