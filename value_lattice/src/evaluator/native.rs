//! Native implementations of pure library methods.
//!
//! Only methods of a small closed set of owner types are evaluated. A call to
//! any other owner, or to an unregistered method, fails softly with
//! `MethodNotFound` and the caller falls back to `Unknown`.

use super::{cartesian_eval, EvalError, Evaluator, OpId};
use crate::const_prop::ConcreteValue;
use crate::diagnostics::{emit_method_failed, emit_method_not_found};
use crate::ir::MethodId;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Owner types whose methods may be evaluated.
static COVERED_OWNERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "String",
        "Math",
        "Integer",
        "Long",
        "Character",
        "Boolean",
    ]
    .into_iter()
    .collect()
});

/// Native implementation: receiver (for instance methods) and one argument tuple.
pub type NativeFn =
    fn(Option<&ConcreteValue>, &[ConcreteValue]) -> Result<ConcreteValue, EvalError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    owner: String,
    name: String,
    arity: usize,
}

#[derive(Debug, Clone, Copy)]
struct NativeMethod {
    is_static: bool,
    func: NativeFn,
}

/// Table of natively implemented library methods.
#[derive(Debug, Default)]
pub struct NativeEvaluator {
    methods: HashMap<MethodKey, NativeMethod>,
}

impl NativeEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with the standard string, math and boxing methods registered.
    pub fn with_defaults() -> Self {
        let mut evaluator = Self::new();
        register_string_methods(&mut evaluator);
        register_math_methods(&mut evaluator);
        register_boxing_methods(&mut evaluator);
        evaluator
    }

    pub fn register(&mut self, method: MethodId, arity: usize, func: NativeFn) {
        self.methods.insert(
            MethodKey {
                owner: method.owner,
                name: method.name,
                arity,
            },
            NativeMethod {
                is_static: method.is_static,
                func,
            },
        );
    }

    pub fn is_covered_owner(owner: &str) -> bool {
        COVERED_OWNERS.contains(owner)
    }

    fn lookup(&self, method: &MethodId, arity: usize) -> Result<NativeMethod, EvalError> {
        let key = MethodKey {
            owner: method.owner.clone(),
            name: method.name.clone(),
            arity,
        };
        match self.methods.get(&key) {
            Some(native) if Self::is_covered_owner(&method.owner) => Ok(*native),
            _ => {
                emit_method_not_found(&method.to_string());
                Err(EvalError::MethodNotFound(method.to_string()))
            }
        }
    }
}

impl Evaluator for NativeEvaluator {
    fn try_eval(
        &self,
        op: &OpId,
        receiver: Option<&[ConcreteValue]>,
        args: &[Vec<ConcreteValue>],
        max_combinations: usize,
    ) -> Result<Vec<ConcreteValue>, EvalError> {
        let method = match op {
            OpId::Method(method) => method,
            other => return Err(EvalError::MethodNotFound(other.to_string())),
        };
        let native = self.lookup(method, args.len())?;
        let receiver = if native.is_static {
            None
        } else {
            Some(receiver.ok_or_else(|| EvalError::MissingReceiver(method.to_string()))?)
        };
        let label = method.to_string();
        cartesian_eval(receiver, args, max_combinations, |recv, tuple| {
            (native.func)(recv, tuple).inspect_err(|err| {
                if let EvalError::Exception(message) = err {
                    emit_method_failed(&label, message);
                }
            })
        })
    }
}

// ── argument helpers ──

fn unsupported(method: &str, args: &[ConcreteValue]) -> EvalError {
    let operands: Vec<String> = args.iter().map(ToString::to_string).collect();
    EvalError::UnsupportedOperands {
        op: method.to_string(),
        operands: operands.join(", "),
    }
}

fn recv_str<'a>(
    method: &str,
    receiver: Option<&'a ConcreteValue>,
) -> Result<&'a str, EvalError> {
    match receiver {
        Some(ConcreteValue::Str(s)) => Ok(s),
        Some(other) => Err(unsupported(method, std::slice::from_ref(other))),
        None => Err(EvalError::MissingReceiver(method.to_string())),
    }
}

fn arg_str<'a>(method: &str, args: &'a [ConcreteValue], i: usize) -> Result<&'a str, EvalError> {
    args.get(i)
        .and_then(ConcreteValue::as_str)
        .ok_or_else(|| unsupported(method, args))
}

fn arg_int(method: &str, args: &[ConcreteValue], i: usize) -> Result<i64, EvalError> {
    args.get(i)
        .and_then(ConcreteValue::as_i64)
        .ok_or_else(|| unsupported(method, args))
}

fn utf16_slice(s: &str, begin: i64, end: i64) -> Result<String, EvalError> {
    let units: Vec<u16> = s.encode_utf16().collect();
    if begin < 0 || end < begin || end as usize > units.len() {
        return Err(EvalError::Exception(format!(
            "StringIndexOutOfBoundsException: begin {}, end {}, length {}",
            begin,
            end,
            units.len()
        )));
    }
    String::from_utf16(&units[begin as usize..end as usize])
        .map_err(|e| EvalError::Exception(e.to_string()))
}

fn utf16_len(s: &str) -> i32 {
    s.encode_utf16().count() as i32
}

// ── String ──

fn register_string_methods(evaluator: &mut NativeEvaluator) {
    let m = |name: &str| MethodId::instance("String", name);
    evaluator.register(m("length"), 0, string_length);
    evaluator.register(m("isEmpty"), 0, string_is_empty);
    evaluator.register(m("charAt"), 1, string_char_at);
    evaluator.register(m("substring"), 1, string_substring_from);
    evaluator.register(m("substring"), 2, string_substring);
    evaluator.register(m("concat"), 1, string_concat);
    evaluator.register(m("toUpperCase"), 0, string_to_upper);
    evaluator.register(m("toLowerCase"), 0, string_to_lower);
    evaluator.register(m("trim"), 0, string_trim);
    evaluator.register(m("indexOf"), 1, string_index_of);
    evaluator.register(m("startsWith"), 1, string_starts_with);
    evaluator.register(m("endsWith"), 1, string_ends_with);
    evaluator.register(m("equals"), 1, string_equals);
    evaluator.register(MethodId::static_method("String", "valueOf"), 1, string_value_of);
}

fn string_length(
    recv: Option<&ConcreteValue>,
    _args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    Ok(ConcreteValue::Int(utf16_len(recv_str("String.length", recv)?)))
}

fn string_is_empty(
    recv: Option<&ConcreteValue>,
    _args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    Ok(ConcreteValue::Boolean(recv_str("String.isEmpty", recv)?.is_empty()))
}

fn string_char_at(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.charAt", recv)?;
    let index = arg_int("String.charAt", args, 0)?;
    let unit = usize::try_from(index)
        .ok()
        .and_then(|i| s.encode_utf16().nth(i))
        .ok_or_else(|| {
            EvalError::Exception(format!("StringIndexOutOfBoundsException: index {}", index))
        })?;
    Ok(ConcreteValue::Char(unit))
}

fn string_substring_from(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.substring", recv)?;
    let begin = arg_int("String.substring", args, 0)?;
    Ok(ConcreteValue::Str(utf16_slice(s, begin, utf16_len(s) as i64)?))
}

fn string_substring(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.substring", recv)?;
    let begin = arg_int("String.substring", args, 0)?;
    let end = arg_int("String.substring", args, 1)?;
    Ok(ConcreteValue::Str(utf16_slice(s, begin, end)?))
}

fn string_concat(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.concat", recv)?;
    let other = arg_str("String.concat", args, 0)?;
    Ok(ConcreteValue::Str(format!("{}{}", s, other)))
}

fn string_to_upper(
    recv: Option<&ConcreteValue>,
    _args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    Ok(ConcreteValue::Str(recv_str("String.toUpperCase", recv)?.to_uppercase()))
}

fn string_to_lower(
    recv: Option<&ConcreteValue>,
    _args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    Ok(ConcreteValue::Str(recv_str("String.toLowerCase", recv)?.to_lowercase()))
}

fn string_trim(
    recv: Option<&ConcreteValue>,
    _args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.trim", recv)?;
    Ok(ConcreteValue::Str(s.trim_matches(|c: char| c <= ' ').to_string()))
}

fn string_index_of(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.indexOf", recv)?;
    let needle = arg_str("String.indexOf", args, 0)?;
    let index = s.find(needle).map_or(-1, |byte| utf16_len(&s[..byte]));
    Ok(ConcreteValue::Int(index))
}

fn string_starts_with(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.startsWith", recv)?;
    Ok(ConcreteValue::Boolean(s.starts_with(arg_str("String.startsWith", args, 0)?)))
}

fn string_ends_with(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.endsWith", recv)?;
    Ok(ConcreteValue::Boolean(s.ends_with(arg_str("String.endsWith", args, 0)?)))
}

fn string_equals(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = recv_str("String.equals", recv)?;
    Ok(ConcreteValue::Boolean(args.first().and_then(ConcreteValue::as_str) == Some(s)))
}

fn string_value_of(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let value = args.first().ok_or_else(|| unsupported("String.valueOf", args))?;
    Ok(ConcreteValue::Str(value.to_canonical_string()))
}

// ── Math ──

fn register_math_methods(evaluator: &mut NativeEvaluator) {
    let m = |name: &str| MethodId::static_method("Math", name);
    evaluator.register(m("abs"), 1, math_abs);
    evaluator.register(m("min"), 2, math_min);
    evaluator.register(m("max"), 2, math_max);
}

fn math_abs(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    match args.first() {
        Some(ConcreteValue::Long(v)) => Ok(ConcreteValue::Long(v.wrapping_abs())),
        Some(ConcreteValue::Float(v)) => Ok(ConcreteValue::Float(v.abs())),
        Some(ConcreteValue::Double(v)) => Ok(ConcreteValue::Double(v.abs())),
        Some(other) => match other.as_i64() {
            Some(v) => Ok(ConcreteValue::Int((v as i32).wrapping_abs())),
            None => Err(unsupported("Math.abs", args)),
        },
        None => Err(unsupported("Math.abs", args)),
    }
}

fn math_min(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    min_max("Math.min", args, true)
}

fn math_max(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    min_max("Math.max", args, false)
}

fn min_max(method: &str, args: &[ConcreteValue], min: bool) -> Result<ConcreteValue, EvalError> {
    let (a, b) = match args {
        [a, b] => (a, b),
        _ => return Err(unsupported(method, args)),
    };
    let floating =
        |v: &ConcreteValue| matches!(v, ConcreteValue::Float(_) | ConcreteValue::Double(_));
    if floating(a) || floating(b) {
        let (x, y) = match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(unsupported(method, args)),
        };
        let r = if x.is_nan() || y.is_nan() {
            f64::NAN
        } else if min {
            x.min(y)
        } else {
            x.max(y)
        };
        return Ok(ConcreteValue::Double(r));
    }
    let (x, y) = match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(unsupported(method, args)),
    };
    let r = if min { x.min(y) } else { x.max(y) };
    if matches!(a, ConcreteValue::Long(_)) || matches!(b, ConcreteValue::Long(_)) {
        Ok(ConcreteValue::Long(r))
    } else {
        Ok(ConcreteValue::Int(r as i32))
    }
}

// ── boxing and parsing ──

fn register_boxing_methods(evaluator: &mut NativeEvaluator) {
    evaluator.register(MethodId::static_method("Integer", "parseInt"), 1, integer_parse);
    evaluator.register(MethodId::static_method("Integer", "valueOf"), 1, integer_value_of);
    evaluator.register(MethodId::static_method("Integer", "toString"), 1, string_value_of);
    evaluator.register(MethodId::static_method("Long", "parseLong"), 1, long_parse);
    evaluator.register(MethodId::static_method("Long", "toString"), 1, string_value_of);
    evaluator.register(MethodId::static_method("Character", "isDigit"), 1, character_is_digit);
    evaluator.register(MethodId::static_method("Boolean", "parseBoolean"), 1, boolean_parse);
}

fn number_format(s: &str) -> EvalError {
    EvalError::Exception(format!("NumberFormatException: For input string: \"{}\"", s))
}

fn integer_parse(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = arg_str("Integer.parseInt", args, 0)?;
    s.parse::<i32>().map(ConcreteValue::Int).map_err(|_| number_format(s))
}

fn integer_value_of(
    recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    match args.first() {
        Some(ConcreteValue::Str(_)) => integer_parse(recv, args),
        Some(ConcreteValue::Int(v)) => Ok(ConcreteValue::Int(*v)),
        _ => Err(unsupported("Integer.valueOf", args)),
    }
}

fn long_parse(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = arg_str("Long.parseLong", args, 0)?;
    s.parse::<i64>().map(ConcreteValue::Long).map_err(|_| number_format(s))
}

fn character_is_digit(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let c = arg_int("Character.isDigit", args, 0)?;
    let digit = char::from_u32(c as u32).is_some_and(char::is_numeric);
    Ok(ConcreteValue::Boolean(digit))
}

fn boolean_parse(
    _recv: Option<&ConcreteValue>,
    args: &[ConcreteValue],
) -> Result<ConcreteValue, EvalError> {
    let s = arg_str("Boolean.parseBoolean", args, 0)?;
    Ok(ConcreteValue::Boolean(s.eq_ignore_ascii_case("true")))
}
