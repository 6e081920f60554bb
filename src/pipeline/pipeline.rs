use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::core::StageId;
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::slot::{AbstractSlot, SlotDirection, SlotValue};
use crate::pipeline::stage::{Stage, StageCore};

/// A composite stage owning child stages and their slot wiring.
///
/// Children are kept in insertion order, which breaks scheduling ties
/// among independent stages, so frame output is deterministic for
/// identical inputs. The dependency order itself is recomputed from the
/// slot bindings on every processing pass; graphs are small and change
/// rarely, and a cycle among children is reported as a fatal
/// configuration error instead of looping.
pub struct Pipeline {
    core: StageCore,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline named `name`.
    pub fn new(env: &Environment, name: &str) -> Self {
        Self {
            core: StageCore::new(env, name),
            stages: Vec::new(),
        }
    }

    /// Number of child stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the pipeline has no children.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Add a child stage. Stage names must be unique within the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) -> GloperateResult<()> {
        let name = stage.core().name();
        if self.stages.iter().any(|s| s.core().name() == name) {
            return Err(GloperateError::configuration(format!(
                "pipeline '{}' already owns a stage named '{}'",
                self.core.name(),
                name
            )));
        }
        tracing::debug!(
            pipeline = self.core.name(),
            stage = stage.core().name(),
            "add stage"
        );
        self.stages.push(stage);
        self.core.shared.dirty.set(true);
        Ok(())
    }

    /// Remove the child named `name` and return it.
    ///
    /// All slot bindings between the removed stage and the remaining
    /// graph are severed: the removed stage's inputs as well as sibling
    /// and pipeline slots bound to it revert to their local state.
    pub fn remove_stage(&mut self, name: &str) -> GloperateResult<Box<dyn Stage>> {
        let index = self
            .stages
            .iter()
            .position(|s| s.core().name() == name)
            .ok_or_else(|| {
                GloperateError::configuration(format!(
                    "pipeline '{}' has no stage named '{}'",
                    self.core.name(),
                    name
                ))
            })?;
        let removed = self.stages.remove(index);
        let removed_id = removed.core().id();

        for input in removed.core().inputs() {
            input.disconnect();
        }
        for sibling in &self.stages {
            Self::sever_bindings_to(sibling.core(), removed_id);
        }
        Self::sever_bindings_to(&self.core, removed_id);

        tracing::debug!(
            pipeline = self.core.name(),
            stage = removed.core().name(),
            "removed stage"
        );
        self.core.shared.dirty.set(true);
        Ok(removed)
    }

    fn sever_bindings_to(core: &StageCore, removed: StageId) {
        for slot in core.inputs().into_iter().chain(core.outputs()) {
            if slot.source_stage() == Some(removed) {
                slot.disconnect();
            }
        }
    }

    /// Borrow the child named `name`.
    pub fn stage(&self, name: &str) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|s| s.core().name() == name)
            .map(|s| s.as_ref())
    }

    /// Mutably borrow the child named `name`.
    pub fn stage_mut(&mut self, name: &str) -> Option<&mut (dyn Stage + 'static)> {
        self.stages
            .iter_mut()
            .find(|s| s.core().name() == name)
            .map(|s| s.as_mut())
    }

    /// Child stage names in insertion order.
    pub fn stage_names(&self) -> Vec<String> {
        self.stages
            .iter()
            .map(|s| s.core().name().to_string())
            .collect()
    }

    /// Bind `dest` to `source`. Statically typed; mismatches cannot
    /// compile.
    pub fn connect<T: SlotValue>(&self, source: &Output<T>, dest: &Input<T>) {
        dest.connect_to(source);
    }

    /// Bind two slots addressed by path.
    ///
    /// A path is either `stage.slot` for a child's slot or a bare slot
    /// name for the pipeline's own. Input destinations are bound to the
    /// source; output destinations become pass-through mirrors of the
    /// source output. Payload types are checked and a mismatch leaves
    /// both slots' prior bindings untouched.
    pub fn connect_slots(&self, source: &str, dest: &str) -> GloperateResult<()> {
        let source_slot = self.resolve_slot(source)?;
        let dest_slot = self.resolve_slot(dest)?;
        match dest_slot.direction() {
            SlotDirection::Input => dest_slot.connect_from(source_slot.as_ref()),
            SlotDirection::Output => dest_slot.forward_from(source_slot.as_ref()),
        }
    }

    /// Resolve a `stage.slot` or bare `slot` path to a slot.
    pub fn resolve_slot(&self, path: &str) -> GloperateResult<Rc<dyn AbstractSlot>> {
        let (core, slot_name) = match path.split_once('.') {
            Some((stage_name, slot_name)) => {
                let stage = self.stage(stage_name).ok_or_else(|| {
                    GloperateError::configuration(format!(
                        "pipeline '{}' has no stage named '{}'",
                        self.core.name(),
                        stage_name
                    ))
                })?;
                (stage.core(), slot_name)
            }
            None => (&self.core, path),
        };
        core.find_slot(slot_name).ok_or_else(|| {
            GloperateError::configuration(format!(
                "stage '{}' has no slot named '{}'",
                core.name(),
                slot_name
            ))
        })
    }

    /// Describe the pipeline as JSON: stages in insertion order with
    /// their slots' types, validity and current scriptable values.
    pub fn describe(&self) -> serde_json::Value {
        fn slot_entry(slot: &Rc<dyn AbstractSlot>) -> serde_json::Value {
            serde_json::json!({
                "name": slot.name(),
                "type": format!("{:?}", slot.type_tag()),
                "valid": slot.is_valid(),
                "value": serde_json::to_value(slot.get_variant())
                    .unwrap_or(serde_json::Value::Null),
            })
        }
        fn stage_entry(core: &StageCore) -> serde_json::Value {
            serde_json::json!({
                "name": core.name(),
                "inputs": core.inputs().iter().map(slot_entry).collect::<Vec<_>>(),
                "outputs": core.outputs().iter().map(slot_entry).collect::<Vec<_>>(),
            })
        }
        let mut value = stage_entry(&self.core);
        value["stages"] = serde_json::Value::Array(
            self.stages.iter().map(|s| stage_entry(s.core())).collect(),
        );
        value
    }

    /// Compute the processing order: every stage after all stages feeding
    /// its bound inputs, ties broken by insertion order.
    fn topological_order(&self) -> GloperateResult<Vec<usize>> {
        let count = self.stages.len();
        let index_of: HashMap<StageId, usize> = self
            .stages
            .iter()
            .enumerate()
            .map(|(index, stage)| (stage.core().id(), index))
            .collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut indegree = vec![0usize; count];
        for (index, stage) in self.stages.iter().enumerate() {
            for input in stage.core().inputs() {
                let Some(source) = input.source_stage() else {
                    continue;
                };
                // Bindings to the pipeline's own slots or to outer stages
                // impose no ordering among the children.
                let Some(&producer) = index_of.get(&source) else {
                    continue;
                };
                if producer != index {
                    dependents[producer].push(index);
                    indegree[index] += 1;
                }
            }
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(index, _)| index)
            .collect();
        let mut order = Vec::with_capacity(count);
        while let Some(&index) = ready.iter().next() {
            ready.remove(&index);
            order.push(index);
            for &dependent in &dependents[index] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != count {
            let cycle: Vec<&str> = indegree
                .iter()
                .enumerate()
                .filter(|&(_, &degree)| degree > 0)
                .map(|(index, _)| self.stages[index].core().name())
                .collect();
            return Err(GloperateError::configuration(format!(
                "cyclic dependency among stages in pipeline '{}': {}",
                self.core.name(),
                cycle.join(", ")
            )));
        }
        Ok(order)
    }
}

impl Stage for Pipeline {
    fn core(&self) -> &StageCore {
        &self.core
    }

    /// Process all children in dependency order.
    ///
    /// A child failing with a stage-local error is logged and skipped for
    /// the frame, leaving its outputs at their pre-failure validity;
    /// siblings still process. Fatal configuration errors abort the pass.
    fn on_process(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        let order = self.topological_order()?;
        for index in order {
            let stage = self.stages[index].as_mut();
            match stage.process(ctx) {
                Ok(()) => {}
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        pipeline = self.core.name(),
                        stage = stage.core().name(),
                        %error,
                        "stage failed; outputs left stale for this frame"
                    );
                }
            }
        }
        Ok(())
    }

    fn init_context(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        if !self.core.is_context_initialized() {
            tracing::debug!(pipeline = self.core.name(), "init context");
            self.on_context_init(ctx)?;
            self.core.shared.context_initialized.set(true);
            self.core.shared.dirty.set(true);
        }
        // Always descend: children added after a previous pass pick up
        // the context here, already-initialized ones no-op.
        for stage in &mut self.stages {
            stage.init_context(ctx)?;
        }
        Ok(())
    }

    fn deinit_context(&mut self, ctx: &mut dyn RenderContext) {
        for stage in self.stages.iter_mut().rev() {
            stage.deinit_context(ctx);
        }
        if self.core.is_context_initialized() {
            tracing::debug!(pipeline = self.core.name(), "deinit context");
            self.on_context_deinit(ctx);
            self.core.shared.context_initialized.set(false);
        }
    }

    fn needs_processing(&self) -> bool {
        self.core.needs_processing() || self.stages.iter().any(|stage| stage.needs_processing())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/pipeline.rs"]
mod tests;
