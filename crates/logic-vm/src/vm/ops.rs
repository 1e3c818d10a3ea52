//! Operator evaluation for `Op` and `Jump`

use crate::instruction::{ConditionOp, LogicOp};
use crate::value::Value;
use noise::{NoiseFn, Simplex};
use std::sync::OnceLock;

/// Tolerance of numeric equality
pub const EQUALITY_EPSILON: f64 = 0.000001;

static SIMPLEX: OnceLock<Simplex> = OnceLock::new();

fn simplex() -> &'static Simplex {
    SIMPLEX.get_or_init(|| Simplex::new(0))
}

/// Largest coordinate magnitude simplex noise can floor into its lattice
const NOISE_LIMIT: f64 = i32::MAX as f64;

/// 2-D simplex noise; coordinates outside the lattice range give 0
fn noise(x: f64, y: f64) -> f64 {
    if !(x.abs() <= NOISE_LIMIT && y.abs() <= NOISE_LIMIT) {
        return 0.0;
    }
    simplex().get([x, y])
}

/// Stateless operator implementations
pub(crate) struct ValueOperations;

impl ValueOperations {
    /// Evaluate `op` over two slot values. The result is numeric and may be
    /// degenerate; callers sanitize on write.
    pub(crate) fn apply(op: LogicOp, left: &Value, right: &Value) -> f64 {
        if op.has_object_variant() && (left.is_object() || right.is_object()) {
            return Self::apply_object(op, left, right);
        }

        let a = left.num();
        if op.is_unary() {
            return Self::apply_unary(op, a);
        }

        let b = right.num();
        match op {
            LogicOp::Add => a + b,
            LogicOp::Sub => a - b,
            LogicOp::Mul => a * b,
            LogicOp::Div => a / b,
            LogicOp::Idiv => (a / b).floor(),
            LogicOp::Mod => a % b,
            LogicOp::Pow => a.powf(b),
            LogicOp::Equal => bool_num(Self::num_equal(a, b)),
            LogicOp::NotEqual => bool_num(!Self::num_equal(a, b)),
            LogicOp::Land => bool_num(a != 0.0 && b != 0.0),
            LogicOp::LessThan => bool_num(a < b),
            LogicOp::LessThanEq => bool_num(a <= b),
            LogicOp::GreaterThan => bool_num(a > b),
            LogicOp::GreaterThanEq => bool_num(a >= b),
            LogicOp::StrictEqual => bool_num(a == b),
            LogicOp::Shl => (a as i64).wrapping_shl(b as i64 as u32) as f64,
            LogicOp::Shr => (a as i64).wrapping_shr(b as i64 as u32) as f64,
            LogicOp::Or => ((a as i64) | (b as i64)) as f64,
            LogicOp::And => ((a as i64) & (b as i64)) as f64,
            LogicOp::Xor => ((a as i64) ^ (b as i64)) as f64,
            LogicOp::Max => a.max(b),
            LogicOp::Min => a.min(b),
            LogicOp::Angle => {
                let angle = b.atan2(a).to_degrees();
                if angle < 0.0 {
                    angle + 360.0
                } else {
                    angle
                }
            }
            LogicOp::Len => (a * a + b * b).sqrt(),
            LogicOp::Noise => noise(a, b),
            _ => unreachable!("Unary operator in binary path"),
        }
    }

    fn apply_unary(op: LogicOp, a: f64) -> f64 {
        match op {
            LogicOp::Not => !(a as i64) as f64,
            LogicOp::Abs => a.abs(),
            LogicOp::Log => a.ln(),
            LogicOp::Log10 => a.log10(),
            LogicOp::Sin => a.to_radians().sin(),
            LogicOp::Cos => a.to_radians().cos(),
            LogicOp::Tan => a.to_radians().tan(),
            LogicOp::Floor => a.floor(),
            LogicOp::Ceil => a.ceil(),
            LogicOp::Sqrt => a.sqrt(),
            LogicOp::Rand => rand::random::<f64>() * a,
            _ => unreachable!("Binary operator in unary path"),
        }
    }

    fn apply_object(op: LogicOp, left: &Value, right: &Value) -> f64 {
        match op {
            LogicOp::Equal => bool_num(left.object() == right.object()),
            LogicOp::NotEqual => bool_num(left.object() != right.object()),
            LogicOp::StrictEqual => bool_num(Self::strict_equal(left, right)),
            _ => unreachable!("Operator without object variant"),
        }
    }

    /// Evaluate a jump condition
    pub(crate) fn condition(op: ConditionOp, left: &Value, right: &Value) -> bool {
        match op {
            ConditionOp::Always => true,
            ConditionOp::Equal => Self::loose_equal(left, right),
            ConditionOp::NotEqual => !Self::loose_equal(left, right),
            ConditionOp::StrictEqual => Self::strict_equal(left, right),
            ConditionOp::LessThan => left.num() < right.num(),
            ConditionOp::LessThanEq => left.num() <= right.num(),
            ConditionOp::GreaterThan => left.num() > right.num(),
            ConditionOp::GreaterThanEq => left.num() >= right.num(),
        }
    }

    /// Object identity when either side is an object, epsilon equality otherwise
    fn loose_equal(left: &Value, right: &Value) -> bool {
        if left.is_object() || right.is_object() {
            left.object() == right.object()
        } else {
            Self::num_equal(left.num(), right.num())
        }
    }

    /// Same tag and same payload
    fn strict_equal(left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }

    #[inline]
    fn num_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < EQUALITY_EPSILON
    }
}

#[inline]
fn bool_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
