use super::*;
use crate::base::environment::Environment;
use crate::foundation::error::GloperateError;
use crate::pipeline::stage::Stage;
use crate::stages::timer::TimerStage;

#[test]
fn registers_and_creates_by_name() {
    let env = Environment::new();
    let registry = ComponentRegistry::new();
    registry.register::<Box<dyn Stage>, _>("timer", |env| {
        Box::new(TimerStage::new(env, "timer"))
    });

    assert!(registry.contains::<Box<dyn Stage>>("timer"));
    let stage = registry.create::<Box<dyn Stage>>("timer", &env).unwrap();
    assert_eq!(stage.core().name(), "timer");
}

#[test]
fn unknown_names_are_configuration_errors() {
    let env = Environment::new();
    let registry = ComponentRegistry::new();
    let result = registry.create::<Box<dyn Stage>>("ghost", &env);
    assert!(matches!(result, Err(GloperateError::Configuration(_))));
}

#[test]
fn type_mismatches_are_reported_not_panicked() {
    let env = Environment::new();
    let registry = ComponentRegistry::new();
    registry.register::<u32, _>("answer", |_| 42u32);

    assert!(!registry.contains::<String>("answer"));
    let result = registry.create::<String>("answer", &env);
    assert!(matches!(result, Err(GloperateError::Configuration(_))));
    assert_eq!(registry.create::<u32>("answer", &env).unwrap(), 42);
}

#[test]
fn names_are_filtered_by_type() {
    let env = Environment::new();
    let registry = ComponentRegistry::new();
    registry.register::<u32, _>("b", |_| 2u32);
    registry.register::<u32, _>("a", |_| 1u32);
    registry.register::<String, _>("c", |_| String::new());
    let _ = env;

    assert_eq!(registry.names_of::<u32>(), vec!["a", "b"]);
    assert_eq!(registry.names_of::<String>(), vec!["c"]);
}

#[test]
fn builtin_stages_are_registered_on_the_environment() {
    let env = Environment::new();
    for name in ["ClearStage", "TextureLoadStage", "TimerStage"] {
        assert!(env.components().contains::<Box<dyn Stage>>(name));
    }
    let stage = env
        .components()
        .create::<Box<dyn Stage>>("TimerStage", &env)
        .unwrap();
    assert_eq!(stage.core().name(), "timer");
}
