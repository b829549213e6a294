//! Per-node evaluation dispatch.

use hashbrown::HashMap;
use vizij_expr_core::RotateOrder;

use super::graph_runtime::GraphRuntime;
use super::noise::{value_noise, value_noise_derivative};
use super::numeric::{as_bool, as_float, as_vector, binary_numeric, dot, length, unary_numeric};
use super::rotation::{
    axis_angle, euler_to_quat, matrix_from, matrix_to_vec, quat_to_vec, rotation_from, slerp,
    trs_matrix, vec_to_quat,
};
use super::variadic::collect_variadic;
use crate::error::GraphError;
use crate::types::{GraphValue, NodeSpec, NodeType, DEFAULT_PORT};

fn read_inputs(rt: &GraphRuntime, spec: &NodeSpec) -> Result<HashMap<String, GraphValue>, GraphError> {
    spec.inputs
        .iter()
        .map(|(input_key, conn)| {
            rt.value(&conn.node_id, &conn.output_key)
                .cloned()
                .map(|val| (input_key.clone(), val))
                .ok_or_else(|| GraphError::MissingOutput {
                    node: conn.node_id.clone(),
                    port: conn.output_key.clone(),
                })
        })
        .collect()
}

macro_rules! out_map {
    ($($key:expr => $val:expr),+ $(,)?) => {{
        let mut map = HashMap::new();
        $(map.insert($key.to_string(), $val);)+
        map
    }};
    ($val:expr) => {
        out_map!(DEFAULT_PORT => $val)
    };
}

/// Three components, broadcasting a lone scalar.
fn vec3(v: &GraphValue) -> Option<[f64; 3]> {
    match as_vector(v).as_slice() {
        [x, y, z] => Some([*x, *y, *z]),
        [s] => Some([*s, *s, *s]),
        _ => None,
    }
}

fn order_from_index(v: &GraphValue) -> RotateOrder {
    let index = as_float(v).round().clamp(0.0, (RotateOrder::ALL.len() - 1) as f64);
    RotateOrder::from_index(index as usize).unwrap_or(RotateOrder::Xyz)
}

pub fn eval_node(rt: &mut GraphRuntime, spec: &NodeSpec) -> Result<(), GraphError> {
    let ivals = read_inputs(rt, spec)?;
    let p = &spec.params;

    let get_input = |key: &str| ivals.get(key).cloned().unwrap_or_default();
    let fail = |reason: &str| GraphError::evaluation(&spec.id, reason);
    let order = || {
        ivals
            .get("order")
            .map(order_from_index)
            .or(p.order)
            .unwrap_or(RotateOrder::Xyz)
    };

    let outputs = match spec.kind {
        NodeType::Constant => out_map!(p.value.clone().unwrap_or_default()),
        NodeType::Input => {
            let staged = p
                .name
                .as_deref()
                .and_then(|name| rt.get_input(name))
                .map(|staged| staged.value.clone());
            out_map!(staged.or_else(|| p.value.clone()).unwrap_or_default())
        }
        NodeType::Output => {
            let value = get_input("in");
            if let Some(name) = &p.name {
                rt.results.insert(name.clone(), value.clone());
            }
            out_map!(value)
        }

        NodeType::Add => out_map!(binary_numeric(&get_input("lhs"), &get_input("rhs"), |a, b| a + b)),
        NodeType::Subtract => {
            out_map!(binary_numeric(&get_input("lhs"), &get_input("rhs"), |a, b| a - b))
        }
        NodeType::Multiply => {
            out_map!(binary_numeric(&get_input("lhs"), &get_input("rhs"), |a, b| a * b))
        }
        NodeType::Divide => out_map!(binary_numeric(
            &get_input("lhs"),
            &get_input("rhs"),
            |a, b| if b != 0.0 { a / b } else { f64::NAN }
        )),
        NodeType::Power => out_map!(binary_numeric(&get_input("lhs"), &get_input("rhs"), f64::powf)),

        NodeType::And => out_map!(GraphValue::Bool(
            as_bool(&get_input("lhs")) && as_bool(&get_input("rhs"))
        )),
        NodeType::Or => out_map!(GraphValue::Bool(
            as_bool(&get_input("lhs")) || as_bool(&get_input("rhs"))
        )),
        NodeType::Xor => out_map!(GraphValue::Bool(
            as_bool(&get_input("lhs")) ^ as_bool(&get_input("rhs"))
        )),
        NodeType::Not => out_map!(GraphValue::Bool(!as_bool(&get_input("in")))),

        NodeType::Condition => {
            let comparison = p.comparison.ok_or_else(|| fail("missing comparison"))?;
            let pass = comparison.test(as_float(&get_input("lhs")), as_float(&get_input("rhs")));
            out_map!(if pass {
                get_input("then")
            } else {
                get_input("else")
            })
        }
        NodeType::Clamp => {
            let low = binary_numeric(&get_input("in"), &get_input("min"), f64::max);
            out_map!(binary_numeric(&low, &get_input("max"), f64::min))
        }
        NodeType::Lerp => {
            let a = get_input("a");
            let delta = binary_numeric(&get_input("b"), &a, |x, y| x - y);
            let scaled = binary_numeric(&delta, &get_input("t"), |x, y| x * y);
            out_map!(binary_numeric(&a, &scaled, |x, y| x + y))
        }
        NodeType::Remap => {
            let in_min = as_float(&get_input("in_min"));
            let in_max = as_float(&get_input("in_max"));
            let out_min = as_float(&get_input("out_min"));
            let out_max = as_float(&get_input("out_max"));
            out_map!(unary_numeric(&get_input("in"), |x| {
                let t = ((x - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
                out_min + t * (out_max - out_min)
            }))
        }

        NodeType::Cos => out_map!(unary_numeric(&get_input("in"), f64::cos)),
        NodeType::Sin => out_map!(unary_numeric(&get_input("in"), f64::sin)),
        NodeType::Acos => out_map!(unary_numeric(&get_input("in"), f64::acos)),
        NodeType::Asin => out_map!(unary_numeric(&get_input("in"), f64::asin)),
        NodeType::Atan => out_map!(unary_numeric(&get_input("in"), f64::atan)),

        NodeType::Noise => out_map!(unary_numeric(&get_input("in"), value_noise)),
        NodeType::Dnoise => out_map!(unary_numeric(&get_input("in"), value_noise_derivative)),

        NodeType::Component => {
            let index = p.index.unwrap_or(0);
            let component = as_vector(&get_input("in"))
                .get(index)
                .copied()
                .unwrap_or(f64::NAN);
            out_map!(GraphValue::Float(component))
        }
        NodeType::Join => {
            let joined: Vec<f64> = collect_variadic(&ivals).iter().flat_map(as_vector).collect();
            out_map!(GraphValue::Vector(joined))
        }
        NodeType::Normalize => {
            let v = as_vector(&get_input("in"));
            let len = length(&v);
            out_map!(GraphValue::Vector(if len > 0.0 {
                v.iter().map(|x| x / len).collect()
            } else {
                vec![0.0; v.len()]
            }))
        }
        NodeType::Dot => {
            let a = as_vector(&get_input("a"));
            let b = as_vector(&get_input("b"));
            out_map!(GraphValue::Float(if a.len() == b.len() {
                dot(&a, &b)
            } else {
                f64::NAN
            }))
        }
        NodeType::Cross => {
            let a = as_vector(&get_input("a"));
            let b = as_vector(&get_input("b"));
            out_map!(GraphValue::Vector(match (a.as_slice(), b.as_slice()) {
                ([ax, ay, az], [bx, by, bz]) => {
                    vec![ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx]
                }
                _ => vec![f64::NAN; 3],
            }))
        }
        NodeType::Length => out_map!(GraphValue::Float(length(&as_vector(&get_input("in"))))),
        NodeType::Distance => {
            let delta = binary_numeric(&get_input("a"), &get_input("b"), |x, y| x - y);
            out_map!(GraphValue::Float(length(&as_vector(&delta))))
        }
        NodeType::Angle => {
            let a = as_vector(&get_input("a"));
            let b = as_vector(&get_input("b"));
            let denom = length(&a) * length(&b);
            out_map!(GraphValue::Float(if a.len() == b.len() && denom > 0.0 {
                (dot(&a, &b) / denom).clamp(-1.0, 1.0).acos()
            } else {
                f64::NAN
            }))
        }

        NodeType::Euler => {
            let angles = match ivals.get("in") {
                Some(v) => match as_vector(v).as_slice() {
                    [x, y, z] => [*x, *y, *z],
                    _ => return Err(fail("euler input must have 3 components")),
                },
                None => [
                    as_float(&get_input("in_0")),
                    as_float(&get_input("in_1")),
                    as_float(&get_input("in_2")),
                ],
            };
            let q = euler_to_quat(angles, order());
            out_map!(
                DEFAULT_PORT => GraphValue::Vector(angles.to_vec()),
                "quat" => GraphValue::Vector(quat_to_vec(&q)),
            )
        }
        NodeType::RotateOrder => {
            out_map!(GraphValue::Float(order_from_index(&get_input("in")).index() as f64))
        }
        NodeType::Quat => {
            let values = collect_variadic(&ivals);
            let q = match values.as_slice() {
                [single] => match as_vector(single).as_slice() {
                    [x, y, z] => Some(euler_to_quat([*x, *y, *z], order())),
                    v => vec_to_quat(v),
                },
                [axis, angle] => axis_angle(&as_vector(axis), as_float(angle)),
                [x, y, z] => Some(euler_to_quat([as_float(x), as_float(y), as_float(z)], order())),
                [x, y, z, w] => vec_to_quat(&[as_float(x), as_float(y), as_float(z), as_float(w)]),
                _ => None,
            }
            .ok_or_else(|| fail("cannot build a quaternion from these inputs"))?;
            out_map!(GraphValue::Vector(quat_to_vec(&q)))
        }
        NodeType::Slerp => {
            let a = rotation_from(&as_vector(&get_input("a")))
                .ok_or_else(|| fail("slerp start is not a rotation"))?;
            let b = rotation_from(&as_vector(&get_input("b")))
                .ok_or_else(|| fail("slerp end is not a rotation"))?;
            let q = slerp(&a, &b, as_float(&get_input("t")));
            out_map!(GraphValue::Vector(quat_to_vec(&q)))
        }
        NodeType::Transform => {
            let translate = match ivals.get("translate") {
                Some(v) => vec3(v).ok_or_else(|| fail("translate must have 3 components"))?,
                None => [0.0; 3],
            };
            let rotate = match ivals.get("rotate") {
                Some(v) => rotation_from(&as_vector(v))
                    .ok_or_else(|| fail("rotate must be Euler angles or a quaternion"))?,
                None => nalgebra::UnitQuaternion::identity(),
            };
            let scale = match ivals.get("scale") {
                Some(v) => vec3(v).ok_or_else(|| fail("scale must have 1 or 3 components"))?,
                None => [1.0; 3],
            };
            let m = trs_matrix(translate, &rotate, scale);
            out_map!(
                DEFAULT_PORT => GraphValue::Vector(matrix_to_vec(&m)),
                "translate" => GraphValue::Vector(translate.to_vec()),
                "rotate" => GraphValue::Vector(quat_to_vec(&rotate)),
                "scale" => GraphValue::Vector(scale.to_vec()),
            )
        }
        NodeType::Matrix => {
            let components: Vec<f64> = collect_variadic(&ivals).iter().flat_map(as_vector).collect();
            let m = matrix_from(&components)
                .ok_or_else(|| fail("matrix needs 9 or 16 components"))?;
            out_map!(GraphValue::Vector(matrix_to_vec(&m)))
        }

        NodeType::Int => out_map!(unary_numeric(&get_input("in"), f64::trunc)),
        NodeType::Bool => out_map!(GraphValue::Bool(as_bool(&get_input("in")))),
        NodeType::Switch => {
            let options = collect_variadic(&ivals);
            if options.is_empty() {
                return Err(fail("switch has no options"));
            }
            let last = (options.len() - 1) as f64;
            let index = as_float(&get_input("selector")).floor().clamp(0.0, last) as usize;
            out_map!(options[index].clone())
        }
    };

    rt.outputs.insert(spec.id.clone(), outputs);
    Ok(())
}
