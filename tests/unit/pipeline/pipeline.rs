use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::base::context::{HeadlessContext, RenderContext};
use crate::base::environment::Environment;
use crate::foundation::error::GloperateError;
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::stage::{Stage, StageCore};

type ProcessLog = Rc<RefCell<Vec<&'static str>>>;

/// Sums its two inputs; appends its name to a shared log on process.
struct AdderStage {
    core: StageCore,
    name: &'static str,
    lhs: Input<i64>,
    rhs: Input<i64>,
    sum: Output<i64>,
    log: ProcessLog,
    fail: bool,
}

impl AdderStage {
    fn new(env: &Environment, name: &'static str, log: &ProcessLog) -> Self {
        let core = StageCore::new(env, name);
        let lhs = Input::new(&core, "lhs", 0i64);
        let rhs = Input::new(&core, "rhs", 0i64);
        let sum = Output::new(&core, "sum", 0i64);
        Self {
            core,
            name,
            lhs,
            rhs,
            sum,
            log: Rc::clone(log),
            fail: false,
        }
    }

    fn boxed(env: &Environment, name: &'static str, log: &ProcessLog) -> Box<Self> {
        Box::new(Self::new(env, name, log))
    }
}

impl Stage for AdderStage {
    fn core(&self) -> &StageCore {
        &self.core
    }

    fn on_process(&mut self, _ctx: &mut dyn RenderContext) -> crate::GloperateResult<()> {
        self.log.borrow_mut().push(self.name);
        if self.fail {
            return Err(GloperateError::process("synthetic failure"));
        }
        self.sum.set(self.lhs.get() + self.rhs.get());
        Ok(())
    }
}

fn setup() -> (Environment, HeadlessContext, Pipeline, ProcessLog) {
    let env = Environment::new();
    let ctx = HeadlessContext::new(&env, 4, 4);
    let pipeline = Pipeline::new(&env, "pipeline");
    let log: ProcessLog = Rc::new(RefCell::new(Vec::new()));
    (env, ctx, pipeline, log)
}

#[test]
fn duplicate_stage_names_are_rejected() {
    let (env, _ctx, mut pipeline, log) = setup();
    pipeline.add_stage(AdderStage::boxed(&env, "a", &log)).unwrap();
    let result = pipeline.add_stage(AdderStage::boxed(&env, "a", &log));
    assert!(matches!(result, Err(GloperateError::Configuration(_))));
}

#[test]
fn diamond_dependency_processes_in_topological_order() {
    let (env, mut ctx, mut pipeline, log) = setup();

    // a feeds b and c, both feed d; d runs last, exactly once.
    let a = AdderStage::new(&env, "a", &log);
    let b = AdderStage::new(&env, "b", &log);
    let c = AdderStage::new(&env, "c", &log);
    let d = AdderStage::new(&env, "d", &log);
    b.lhs.connect_to(&a.sum);
    c.lhs.connect_to(&a.sum);
    d.lhs.connect_to(&b.sum);
    d.rhs.connect_to(&c.sum);
    a.lhs.set(1);

    // Insertion order deliberately scrambled; dependencies win.
    pipeline.add_stage(Box::new(d)).unwrap();
    pipeline.add_stage(Box::new(c)).unwrap();
    pipeline.add_stage(Box::new(b)).unwrap();
    pipeline.add_stage(Box::new(a)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();

    let order = log.borrow().clone();
    assert_eq!(order.len(), 4, "each stage processes exactly once");
    let position =
        |name: &str| order.iter().position(|n| *n == name).unwrap();
    assert!(position("a") < position("b"));
    assert!(position("a") < position("c"));
    assert!(position("b") < position("d"));
    assert!(position("c") < position("d"));

    let sum = pipeline.resolve_slot("d.sum").unwrap().get_variant();
    assert_eq!(sum.as_i64(), Some(2));
}

#[test]
fn independent_stages_keep_insertion_order() {
    let (env, mut ctx, mut pipeline, log) = setup();
    pipeline.add_stage(AdderStage::boxed(&env, "z", &log)).unwrap();
    pipeline.add_stage(AdderStage::boxed(&env, "m", &log)).unwrap();
    pipeline.add_stage(AdderStage::boxed(&env, "a", &log)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(*log.borrow(), vec!["z", "m", "a"]);
}

#[test]
fn unchanged_children_are_skipped_on_later_frames() {
    let (env, mut ctx, mut pipeline, log) = setup();
    let a = AdderStage::new(&env, "a", &log);
    let b = AdderStage::new(&env, "b", &log);
    b.lhs.connect_to(&a.sum);
    let a_lhs = a.lhs.clone();
    pipeline.add_stage(Box::new(a)).unwrap();
    pipeline.add_stage(Box::new(b)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(log.borrow().len(), 2);

    pipeline.process(&mut ctx).unwrap();
    assert_eq!(log.borrow().len(), 2, "nothing changed, nothing runs");

    a_lhs.set(5);
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "a", "b"]);
}

#[test]
fn cyclic_dependencies_are_a_fatal_configuration_error() {
    let (env, mut ctx, mut pipeline, log) = setup();
    let a = AdderStage::new(&env, "a", &log);
    let b = AdderStage::new(&env, "b", &log);
    b.lhs.connect_to(&a.sum);
    a.lhs.connect_to(&b.sum);
    pipeline.add_stage(Box::new(a)).unwrap();
    pipeline.add_stage(Box::new(b)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    let result = pipeline.process(&mut ctx);
    assert!(matches!(result, Err(GloperateError::Configuration(_))));
    assert!(log.borrow().is_empty(), "no stage runs under a cycle");
}

#[test]
fn failing_stage_does_not_abort_siblings() {
    let (env, mut ctx, mut pipeline, log) = setup();
    let mut a = AdderStage::new(&env, "a", &log);
    a.fail = true;
    let a_sum = a.sum.clone();
    pipeline.add_stage(Box::new(a)).unwrap();
    pipeline.add_stage(AdderStage::boxed(&env, "b", &log)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();

    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert!(!a_sum.is_valid(), "the failed stage's output stays stale");
}

#[test]
fn connect_slots_by_path_including_own_slots() {
    let (env, mut ctx, mut pipeline, log) = setup();
    let threshold = Input::new(pipeline.core(), "threshold", 3i64);
    let result = Output::new(pipeline.core(), "result", 0i64);
    pipeline.add_stage(AdderStage::boxed(&env, "a", &log)).unwrap();

    pipeline.connect_slots("threshold", "a.lhs").unwrap();
    pipeline.connect_slots("a.sum", "result").unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(result.get(), 3);
    assert!(result.is_valid());

    threshold.set(10);
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(result.get(), 10);
}

#[test]
fn mismatched_connects_fail_and_leave_state_untouched() {
    let (env, _ctx, mut pipeline, log) = setup();
    let flag = Output::new(pipeline.core(), "flag", false);
    pipeline.add_stage(AdderStage::boxed(&env, "a", &log)).unwrap();
    pipeline.connect_slots("flag", "a.lhs").unwrap_err();

    // Bind to a valid source first, then fail a rebind.
    let number = Output::new(pipeline.core(), "number", 0i64);
    number.set(4);
    pipeline.connect_slots("number", "a.lhs").unwrap();

    let error = pipeline.connect_slots("flag", "a.lhs").unwrap_err();
    assert!(matches!(error, GloperateError::TypeMismatch(_)));
    let lhs = pipeline.resolve_slot("a.lhs").unwrap();
    assert_eq!(
        lhs.source_stage(),
        Some(pipeline.core().id()),
        "the prior binding survives a failed connect"
    );
    assert_eq!(lhs.get_variant().as_i64(), Some(4));
}

#[test]
fn unknown_paths_are_configuration_errors() {
    let (_env, _ctx, pipeline, _log) = setup();
    assert!(matches!(
        pipeline.connect_slots("ghost.out", "ghost.in"),
        Err(GloperateError::Configuration(_))
    ));
    assert!(matches!(
        pipeline.resolve_slot("nope"),
        Err(GloperateError::Configuration(_))
    ));
}

#[test]
fn removing_a_stage_severs_both_directions() {
    let (env, mut ctx, mut pipeline, log) = setup();
    let a = AdderStage::new(&env, "a", &log);
    let b = AdderStage::new(&env, "b", &log);
    a.lhs.set(2);
    b.lhs.connect_to(&a.sum);
    let b_lhs = b.lhs.clone();
    pipeline.add_stage(Box::new(a)).unwrap();
    pipeline.add_stage(Box::new(b)).unwrap();

    pipeline.init_context(&mut ctx).unwrap();
    pipeline.process(&mut ctx).unwrap();
    assert_eq!(b_lhs.get(), 2);

    let removed = pipeline.remove_stage("a").unwrap();
    assert_eq!(removed.core().name(), "a");
    assert!(pipeline.stage("a").is_none());
    assert!(!b_lhs.is_connected(), "severed inputs revert to local state");
    assert_eq!(b_lhs.get(), 0);
}

#[test]
fn describe_lists_stages_and_slots() {
    let (env, _ctx, mut pipeline, log) = setup();
    pipeline.add_stage(AdderStage::boxed(&env, "a", &log)).unwrap();
    let json = pipeline.describe();
    assert_eq!(json["name"], "pipeline");
    assert_eq!(json["stages"][0]["name"], "a");
    assert_eq!(json["stages"][0]["inputs"][0]["name"], "lhs");
    assert_eq!(json["stages"][0]["outputs"][0]["valid"], false);
}
