//! Stack evaluator: pops the post-order stream from its tail and resolves each token.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::backend::{BackendValue, Derived};
use crate::bindings::Bindings;
use crate::cache::OperationCache;
use crate::dispatch::{invoke, Function, Primitive};
use crate::error::{CompileError, Result};
use crate::token::{Comparison, Constant, Token, TokenStream};
use crate::value::{Sequence, Value};

/// Whether a compile materialises backend nodes or only traces identifier usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    #[default]
    Emit,
    Validate,
}

/// `None` marks a branch with no value: an unresolved identifier or any operation in
/// validate mode, or an assignment.
type Slot<B> = Option<BackendValue<B>>;

/// What a waiting operator does once its operands are in.
enum Pending {
    /// Reverse the operands into written order and route them through the cache.
    Apply(Primitive),
    /// Ternary. The comparison is popped after the two branch operands.
    Condition,
    /// Else marker: yields its single operand.
    Forward,
    Assign,
}

/// An operator popped from the stream, collecting operands in pop order.
struct Frame<H> {
    pending: Pending,
    want: usize,
    operands: Vec<Option<Value<H>>>,
    comparison: Option<Comparison>,
}

impl<H> Frame<H> {
    fn new(pending: Pending, want: usize) -> Self {
        Frame {
            pending,
            want,
            operands: Vec::with_capacity(want),
            comparison: None,
        }
    }
}

enum Step<H> {
    Done(Option<Value<H>>),
    Wait(Frame<H>),
}

fn wait<H>(pending: Pending, want: usize) -> Result<Step<H>> {
    Ok(Step::Wait(Frame::new(pending, want)))
}

/// Resolves one entry of the stream. Operators wait on an explicit frame stack rather
/// than the call stack, so long operator chains cost heap, not recursion. Nesting is
/// bounded when the expression is parsed.
pub(crate) struct Evaluator<'a, B: Derived> {
    pub backend: &'a mut B,
    pub bindings: &'a mut Bindings<B::Handle>,
    pub cache: &'a mut OperationCache<B::Handle>,
    pub stream: &'a mut TokenStream,
    pub mode: CompileMode,
}

impl<'a, B: Derived> Evaluator<'a, B> {
    /// Pop the tail entry and resolve it, popping further entries for its operands.
    pub fn evaluate(&mut self) -> Result<Slot<B>> {
        let mut frames: Vec<Frame<B::Handle>> = Vec::new();
        loop {
            let token = self
                .stream
                .pop()
                .ok_or_else(|| CompileError::StackUnderflow("an operand".to_string()))?;
            let mut value = match self.start(token)? {
                Step::Done(value) => value,
                Step::Wait(frame) if frame.want == 0 => self.finish(frame)?,
                Step::Wait(frame) => {
                    frames.push(frame);
                    continue;
                }
            };

            // Hand the value to the innermost waiting operator, completing as many
            // operators as now have all their operands.
            loop {
                let Some(mut frame) = frames.pop() else {
                    return Ok(value);
                };
                frame.operands.push(value);
                if matches!(frame.pending, Pending::Condition) && frame.operands.len() == 2 {
                    frame.comparison = Some(self.comparison()?);
                }
                if frame.operands.len() < frame.want {
                    frames.push(frame);
                    break;
                }
                value = self.finish(frame)?;
            }
        }
    }

    fn start(&mut self, token: Token) -> Result<Step<B::Handle>> {
        match token {
            Token::Call { name, arity } => {
                let function =
                    Function::from_name(&name).ok_or(CompileError::InvalidOperator(name))?;
                if !function.arity().accepts(arity) {
                    return Err(CompileError::Arity {
                        function: function.name().to_string(),
                        expected: function.arity().to_string(),
                        found: arity,
                    });
                }
                wait(Pending::Apply(Primitive::Call(function)), arity)
            }
            Token::List { arity } => {
                let allowed = Sequence::<B::Handle>::MIN_LEN..=Sequence::<B::Handle>::MAX_LEN;
                if !allowed.contains(&arity) {
                    return Err(CompileError::SequenceLength(arity));
                }
                wait(Pending::Apply(Primitive::List), arity)
            }
            Token::Negate => wait(Pending::Apply(Primitive::Negate), 1),
            Token::Not => wait(Pending::Apply(Primitive::Not), 1),
            // Slots pop as if_false, if_true, comparison, second, first.
            Token::Ternary => wait(Pending::Condition, 4),
            Token::Else => wait(Pending::Forward, 1),
            Token::Binary(op) => wait(Pending::Apply(Primitive::Binary(op)), 2),
            Token::Component(component) => wait(Pending::Apply(Primitive::Component(component)), 1),
            // Destination pops before source.
            Token::Assign => wait(Pending::Assign, 2),
            Token::Constant(constant) => Ok(Step::Done(Some(match constant {
                Constant::True => Value::Bool(true),
                Constant::False => Value::Bool(false),
                Constant::E => Value::Scalar(std::f64::consts::E),
                Constant::Pi => Value::Scalar(std::f64::consts::PI),
            }))),
            Token::RotateOrder(order) => Ok(Step::Done(Some(Value::RotateOrder(order)))),
            Token::Identifier(name) => self.identifier(name).map(Step::Done),
            // Only meaningful as the condition slot of a ternary.
            Token::Comparison(op) => Err(CompileError::InvalidOperator(op.symbol().to_string())),
            Token::Number(text) => text
                .parse::<f64>()
                .map(|v| Step::Done(Some(Value::Scalar(v))))
                .map_err(|_| CompileError::InvalidOperator(text)),
        }
    }

    fn finish(&mut self, frame: Frame<B::Handle>) -> Result<Slot<B>> {
        let Frame {
            pending,
            mut operands,
            comparison,
            ..
        } = frame;
        match pending {
            Pending::Apply(primitive) => {
                operands.reverse();
                self.apply(primitive, operands)
            }
            Pending::Condition => {
                let op = comparison
                    .ok_or_else(|| CompileError::StackUnderflow("a ternary condition".to_string()))?;
                operands.reverse();
                self.apply(Primitive::Condition(op), operands)
            }
            Pending::Forward => Ok(operands.pop().flatten()),
            Pending::Assign => {
                let mut operands = operands.into_iter();
                let destination = operands.next().flatten();
                let source = operands.next().flatten();
                if self.mode == CompileMode::Emit {
                    if let (Some(source), Some(destination)) = (source, destination) {
                        debug!("equal({source}, {destination})");
                        self.backend.equal(source, destination)?;
                    }
                }
                Ok(None)
            }
        }
    }

    /// The ternary's condition slot must hold a bare comparison marker.
    fn comparison(&mut self) -> Result<Comparison> {
        match self.stream.pop() {
            Some(Token::Comparison(op)) => Ok(op),
            Some(other) => Err(CompileError::InvalidOperator(other.to_string())),
            None => Err(CompileError::StackUnderflow("a ternary condition".to_string())),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Slot<B>> {
        if let Some(value) = self.bindings.resolve(&name) {
            return Ok(Some(value));
        }
        match self.mode {
            CompileMode::Emit => Err(CompileError::InvalidIdentifier(name)),
            CompileMode::Validate => {
                self.bindings.mark_invalid(&name);
                Ok(None)
            }
        }
    }

    /// Route a primitive through the operation cache. The backend is called at most
    /// once per signature, and never in validate mode.
    fn apply(&mut self, primitive: Primitive, args: Vec<Slot<B>>) -> Result<Slot<B>> {
        if self.mode == CompileMode::Validate {
            return Ok(None);
        }
        let Some(args) = args.into_iter().collect::<Option<Vec<_>>>() else {
            return Ok(None);
        };

        let rendered: Vec<String> = args.iter().map(|arg| self.bindings.describe(arg)).collect();
        let signature = primitive.signature(&rendered);
        if let Some(cached) = self.cache.lookup(&signature) {
            trace!("cache hit: {signature}");
            return Ok(Some(cached));
        }

        debug!("emit {}: {signature}", primitive.label());
        let value = invoke(&mut *self.backend, &primitive, args)?;
        self.cache.insert(signature, value.clone());
        Ok(Some(value))
    }
}
