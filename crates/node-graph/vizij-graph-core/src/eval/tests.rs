//! Behavioural coverage for the evaluation pipeline.

use super::*;
use crate::types::{GraphSpec, GraphValue, InputConnection, NodeParams, NodeSpec, NodeType};
use approx::assert_relative_eq;
use hashbrown::HashMap;
use vizij_expr_core::{Comparison, RotateOrder};

fn node(id: &str, kind: NodeType, inputs: &[(&str, &str)]) -> NodeSpec {
    NodeSpec {
        id: id.to_string(),
        kind,
        params: NodeParams::default(),
        inputs: inputs
            .iter()
            .map(|(key, from)| (key.to_string(), connection(from, "out")))
            .collect(),
    }
}

fn constant_node(id: &str, value: GraphValue) -> NodeSpec {
    let mut spec = node(id, NodeType::Constant, &[]);
    spec.params.value = Some(value);
    spec
}

fn input_node(id: &str, name: &str, default: Option<GraphValue>) -> NodeSpec {
    let mut spec = node(id, NodeType::Input, &[]);
    spec.params.name = Some(name.to_string());
    spec.params.value = default;
    spec
}

fn output_node(id: &str, name: &str, from: &str) -> NodeSpec {
    let mut spec = node(id, NodeType::Output, &[("in", from)]);
    spec.params.name = Some(name.to_string());
    spec
}

fn connection(node_id: &str, output_key: &str) -> InputConnection {
    InputConnection {
        node_id: node_id.to_string(),
        output_key: output_key.to_string(),
    }
}

fn float(value: Option<&GraphValue>) -> f64 {
    match value {
        Some(GraphValue::Float(v)) => *v,
        other => panic!("expected a float, got {other:?}"),
    }
}

fn vector(value: Option<&GraphValue>) -> Vec<f64> {
    match value {
        Some(GraphValue::Vector(v)) => v.clone(),
        other => panic!("expected a vector, got {other:?}"),
    }
}

fn run(nodes: Vec<NodeSpec>) -> GraphRuntime {
    let mut rt = GraphRuntime::new();
    evaluate_all(&mut rt, &GraphSpec { nodes }).expect("graph evaluates");
    rt
}

// --- Sources and sinks ---------------------------------------------------

#[test]
fn it_should_publish_output_results_by_name() {
    let rt = run(vec![
        constant_node("two", GraphValue::Float(2.0)),
        constant_node("three", GraphValue::Float(3.0)),
        node("sum", NodeType::Add, &[("lhs", "two"), ("rhs", "three")]),
        output_node("out", "total", "sum"),
    ]);
    assert_eq!(rt.result("total"), Some(&GraphValue::Float(5.0)));
    assert_eq!(rt.value("sum", "out"), Some(&GraphValue::Float(5.0)));
}

#[test]
fn it_should_read_staged_inputs_and_fall_back_to_defaults() {
    let spec = GraphSpec {
        nodes: vec![
            input_node("blink", "blink", Some(GraphValue::Float(0.1))),
            input_node("open", "open", None),
            output_node("o_blink", "blink", "blink"),
            output_node("o_open", "open", "open"),
        ],
    };
    let mut rt = GraphRuntime::new();
    rt.set_input("blink", GraphValue::Float(0.75));
    evaluate_all(&mut rt, &spec).expect("evaluates");
    assert_eq!(rt.result("blink"), Some(&GraphValue::Float(0.75)));
    assert_eq!(rt.result("open"), Some(&GraphValue::Float(0.0)));

    // Nothing staged for this pass: the declared default applies again.
    evaluate_all(&mut rt, &spec).expect("evaluates");
    assert_eq!(rt.result("blink"), Some(&GraphValue::Float(0.1)));
}

// --- Arithmetic and conditions -------------------------------------------

#[test]
fn it_should_broadcast_scalars_over_vectors() {
    let rt = run(vec![
        constant_node("v", GraphValue::Vector(vec![1.0, 2.0, 3.0])),
        constant_node("k", GraphValue::Float(2.0)),
        node("scaled", NodeType::Multiply, &[("lhs", "v"), ("rhs", "k")]),
    ]);
    assert_eq!(vector(rt.value("scaled", "out")), vec![2.0, 4.0, 6.0]);
}

#[test]
fn it_should_pick_condition_branches() {
    let mut cond = node(
        "cond",
        NodeType::Condition,
        &[("lhs", "x"), ("rhs", "zero"), ("then", "a"), ("else", "b")],
    );
    cond.params.comparison = Some(Comparison::Greater);
    let rt = run(vec![
        constant_node("x", GraphValue::Float(-1.0)),
        constant_node("zero", GraphValue::Float(0.0)),
        constant_node("a", GraphValue::Float(10.0)),
        constant_node("b", GraphValue::Float(20.0)),
        cond,
    ]);
    assert_eq!(float(rt.value("cond", "out")), 20.0);
}

#[test]
fn it_should_clamp_the_switch_selector() {
    let rt = run(vec![
        constant_node("sel", GraphValue::Float(7.0)),
        constant_node("a", GraphValue::Float(1.0)),
        constant_node("b", GraphValue::Float(2.0)),
        node(
            "pick",
            NodeType::Switch,
            &[("selector", "sel"), ("in_0", "a"), ("in_1", "b")],
        ),
    ]);
    assert_eq!(float(rt.value("pick", "out")), 2.0);
}

#[test]
fn it_should_remap_and_clamp_into_the_target_range() {
    let rt = run(vec![
        constant_node("x", GraphValue::Float(0.5)),
        constant_node("zero", GraphValue::Float(0.0)),
        constant_node("one", GraphValue::Float(1.0)),
        constant_node("lo", GraphValue::Float(-0.2)),
        constant_node("hi", GraphValue::Float(0.6)),
        constant_node("over", GraphValue::Float(3.0)),
        node(
            "mid",
            NodeType::Remap,
            &[
                ("in", "x"),
                ("in_min", "zero"),
                ("in_max", "one"),
                ("out_min", "lo"),
                ("out_max", "hi"),
            ],
        ),
        node(
            "top",
            NodeType::Remap,
            &[
                ("in", "over"),
                ("in_min", "zero"),
                ("in_max", "one"),
                ("out_min", "lo"),
                ("out_max", "hi"),
            ],
        ),
    ]);
    assert_relative_eq!(float(rt.value("mid", "out")), 0.2, epsilon = 1e-12);
    assert_relative_eq!(float(rt.value("top", "out")), 0.6, epsilon = 1e-12);
}

// --- Rotations -----------------------------------------------------------

#[test]
fn it_should_expose_euler_quaternion_port() {
    let half_pi = std::f64::consts::FRAC_PI_2;
    let mut euler = node("rot", NodeType::Euler, &[("in", "angles")]);
    euler.params.order = Some(RotateOrder::Xyz);
    let rt = run(vec![
        constant_node("angles", GraphValue::Vector(vec![0.0, 0.0, half_pi])),
        euler,
    ]);
    assert_eq!(vector(rt.value("rot", "out")), vec![0.0, 0.0, half_pi]);

    let q = vector(rt.value("rot", "quat"));
    let expected = [0.0, 0.0, (half_pi / 2.0).sin(), (half_pi / 2.0).cos()];
    for (got, want) in q.iter().zip(expected) {
        assert_relative_eq!(*got, want, epsilon = 1e-12);
    }
}

#[test]
fn it_should_build_a_column_major_transform() {
    let rt = run(vec![
        constant_node("t", GraphValue::Vector(vec![1.0, 2.0, 3.0])),
        constant_node("s", GraphValue::Float(2.0)),
        node("xf", NodeType::Transform, &[("translate", "t"), ("scale", "s")]),
    ]);
    let m = vector(rt.value("xf", "out"));
    assert_eq!(m.len(), 16);
    assert_relative_eq!(m[0], 2.0);
    assert_relative_eq!(m[5], 2.0);
    assert_relative_eq!(m[10], 2.0);
    assert_eq!(&m[12..15], &[1.0, 2.0, 3.0]);
    assert_relative_eq!(m[15], 1.0);
    assert_eq!(vector(rt.value("xf", "scale")), vec![2.0, 2.0, 2.0]);
    assert_eq!(vector(rt.value("xf", "rotate")), vec![0.0, 0.0, 0.0, 1.0]);
}

// --- Failures ------------------------------------------------------------

#[test]
fn it_should_report_missing_ports() {
    let mut reader = node("len", NodeType::Length, &[]);
    reader
        .inputs
        .insert("in".to_string(), connection("src", "quat"));
    let spec = GraphSpec {
        nodes: vec![constant_node("src", GraphValue::Float(1.0)), reader],
    };
    let mut rt = GraphRuntime::new();
    let err = evaluate_all(&mut rt, &spec).expect_err("constant has no quat port");
    assert_eq!(
        err,
        GraphError::MissingOutput {
            node: "src".to_string(),
            port: "quat".to_string(),
        }
    );
}

#[test]
fn it_should_reject_switch_without_options() {
    let spec = GraphSpec {
        nodes: vec![
            constant_node("sel", GraphValue::Float(0.0)),
            node("pick", NodeType::Switch, &[("selector", "sel")]),
        ],
    };
    let mut rt = GraphRuntime::new();
    let err = evaluate_all(&mut rt, &spec).expect_err("no options");
    assert!(matches!(err, GraphError::Evaluation { ref node, .. } if node == "pick"));
}

#[test]
fn it_should_clear_stale_outputs_between_passes() {
    let mut rt = GraphRuntime::new();
    evaluate_all(
        &mut rt,
        &GraphSpec {
            nodes: vec![constant_node("old", GraphValue::Float(1.0))],
        },
    )
    .expect("evaluates");
    evaluate_all(
        &mut rt,
        &GraphSpec {
            nodes: vec![constant_node("new", GraphValue::Float(2.0))],
        },
    )
    .expect("evaluates");
    assert!(rt.value("old", "out").is_none());
    let ports: &HashMap<String, GraphValue> = rt.outputs.get("new").expect("new node ran");
    assert_eq!(ports.len(), 1);
}

#[test]
fn it_should_evaluate_noise_for_huge_staged_inputs() {
    let spec = GraphSpec {
        nodes: vec![
            input_node("t", "time", None),
            node("n", NodeType::Noise, &[("in", "t")]),
            node("dn", NodeType::Dnoise, &[("in", "t")]),
        ],
    };
    let mut rt = GraphRuntime::new();
    rt.set_input("time", GraphValue::Float(1e300));
    evaluate_all(&mut rt, &spec).expect("evaluates");
    let n = float(rt.value("n", "out"));
    assert!((-1.0..=1.0).contains(&n));
    assert_eq!(float(rt.value("dn", "out")), 0.0);
}
