use std::collections::BTreeMap;

use approx::assert_relative_eq;
use serde::Deserialize;
use vizij_expr_core::{CompileError, Compiler, Value};
use vizij_graph_core::{GraphBuilder, GraphRuntime, GraphSpec, GraphValue, NodeType, Plug};
use vizij_test_fixtures::rigs;

#[derive(Debug, Deserialize)]
struct Rig {
    inputs: Vec<RigInput>,
    outputs: Vec<String>,
    drivers: Vec<String>,
    expect: BTreeMap<String, GraphValue>,
}

#[derive(Debug, Deserialize)]
struct RigInput {
    name: String,
    #[serde(default)]
    default: Option<GraphValue>,
    #[serde(default)]
    stage: Option<GraphValue>,
}

fn build(rig: &Rig) -> GraphSpec {
    let mut compiler = Compiler::new(GraphBuilder::new());
    let mut bindings: Vec<(String, Value<Plug>)> = Vec::new();
    for input in &rig.inputs {
        let plug = compiler
            .backend_mut()
            .input_with_default(&input.name, input.default.clone());
        bindings.push((input.name.clone(), plug));
    }
    for name in &rig.outputs {
        let plug = compiler.backend_mut().output(name);
        bindings.push((name.clone(), plug));
    }
    for driver in &rig.drivers {
        let value = compiler
            .emit(driver, bindings.clone())
            .unwrap_or_else(|err| panic!("{driver}: {err}"));
        assert!(value.is_none(), "{driver} is an assignment");
    }
    compiler.into_backend().into_spec()
}

fn evaluate(rig: &Rig, spec: &GraphSpec) -> GraphRuntime {
    let mut rt = GraphRuntime::new();
    for input in &rig.inputs {
        if let Some(value) = &input.stage {
            rt.set_input(input.name.clone(), value.clone());
        }
    }
    rt.evaluate_all(spec).expect("rig evaluates");
    rt
}

fn assert_close(name: &str, actual: &GraphValue, expected: &GraphValue) {
    match (actual, expected) {
        (GraphValue::Float(a), GraphValue::Float(e)) => {
            assert_relative_eq!(*a, *e, epsilon = 1e-9);
        }
        (GraphValue::Vector(a), GraphValue::Vector(e)) => {
            assert_eq!(a.len(), e.len(), "{name}: {actual} vs {expected}");
            for (a, e) in a.iter().zip(e) {
                assert_relative_eq!(*a, *e, epsilon = 1e-9);
            }
        }
        (GraphValue::Bool(a), GraphValue::Bool(e)) => assert_eq!(a, e, "{name}"),
        _ => panic!("{name}: expected {expected}, got {actual}"),
    }
}

fn run_rig(key: &str) {
    let rig: Rig = rigs::load(key).expect("rig fixture loads");
    let spec = build(&rig);
    assert_eq!(spec.output_names(), rig.outputs.iter().map(String::as_str).collect::<Vec<_>>());

    let rt = evaluate(&rig, &spec);
    for (name, expected) in &rig.expect {
        let actual = rt
            .result(name)
            .unwrap_or_else(|| panic!("{key}: output {name} was not produced"));
        assert_close(name, actual, expected);
    }
}

#[test]
fn face_rig() {
    run_rig("face");
}

#[test]
fn arm_rig() {
    run_rig("arm");
}

#[test]
fn emitted_specs_survive_json() {
    let rig: Rig = rigs::load("face").expect("rig fixture loads");
    let spec = build(&rig);
    let json = spec.to_json().expect("spec serializes");
    let reloaded = GraphSpec::from_json(&json).expect("spec deserializes");
    assert_eq!(reloaded, spec);

    let rt = evaluate(&rig, &reloaded);
    assert_close("lid", rt.result("lid").expect("lid"), &GraphValue::Float(0.75));
}

#[test]
fn literals_are_shared_across_drivers() {
    let mut compiler = Compiler::new(GraphBuilder::new());
    let bindings = compiler.backend_mut().bindings(&["x"], &["a", "b"]);
    compiler.emit("a = x * 2", bindings.clone()).expect("compiles");
    compiler.emit("b = x + 2", bindings).expect("compiles");
    let spec = compiler.into_backend().into_spec();
    assert_eq!(spec.count(NodeType::Constant), 1);
    assert_eq!(spec.count(NodeType::Input), 1);
}

#[test]
fn validation_leaves_the_graph_untouched() {
    let mut compiler = Compiler::new(GraphBuilder::new());
    let bindings = compiler.backend_mut().bindings(&["blink"], &["lid"]);
    let before = compiler.backend().node_count();
    let report = compiler
        .validate("lid = blink * gain", bindings)
        .expect("validates");
    assert!(report.invalid.contains("gain"));
    assert_eq!(compiler.backend().node_count(), before);
}

#[test]
fn redriving_an_output_keeps_the_last_driver() {
    let mut compiler = Compiler::new(GraphBuilder::new());
    let bindings = compiler.backend_mut().bindings(&["x"], &["y"]);
    compiler.emit("y = x + 1", bindings.clone()).expect("compiles");
    compiler.emit("y = x * 3", bindings).expect("compiles");
    let spec = compiler.into_backend().into_spec();

    let mut rt = GraphRuntime::new();
    rt.set_input("x", GraphValue::Float(2.0));
    rt.evaluate_all(&spec).expect("evaluates");
    assert_eq!(rt.result("y"), Some(&GraphValue::Float(6.0)));
}

#[test]
fn assigning_to_an_input_is_a_backend_error() {
    let mut compiler = Compiler::new(GraphBuilder::new());
    let bindings = compiler.backend_mut().bindings(&["x"], &[]);
    let err = compiler.emit("x = 1", bindings).expect_err("inputs are read-only");
    assert!(matches!(err, CompileError::Backend(_)));
}
