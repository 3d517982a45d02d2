//! Instruction semantics.
//!
//! [`dispatch`] borrows the machine state for exactly one instruction and
//! reports back how the pointer should change, whether the next cell is
//! skipped, and any effect the tick loop must carry out.

use super::ops::{arith, compare, BinaryOp, Comparison};
use super::{FaultKind, MAX_CALL_DEPTH};
use crate::io::{Clock, InputSource};
use crate::pointer::{Direction, Mirror, Pointer};
use rand::{Rng, RngCore};
use starfish_core::{Cell, Codebox, StackFrames, Value};
use std::time::Duration;
use strum::IntoEnumIterator;

/// Mutable state lent to the dispatcher for a single instruction.
pub(crate) struct Machine<'a> {
    pub codebox: &'a mut Codebox,
    pub stacks: &'a mut StackFrames,
    pub calls: &'a mut Vec<(i64, i64)>,
    pub rng: &'a mut dyn RngCore,
    pub clock: &'a dyn Clock,
    pub input: &'a mut dyn InputSource,
    pub compatibility: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    Output(String),
    Pause(Duration),
    Halt,
}

/// What an instruction did to control flow.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    /// Pointer state after the instruction, before the advance.
    pub pointer: Pointer,
    /// Skip the next cell (`!`, `?`).
    pub skip: bool,
    pub effect: Option<Effect>,
}

impl Step {
    fn at(pointer: Pointer) -> Self {
        Self {
            pointer,
            skip: false,
            effect: None,
        }
    }

    fn with_effect(pointer: Pointer, effect: Effect) -> Self {
        Self {
            pointer,
            skip: false,
            effect: Some(effect),
        }
    }
}

impl Machine<'_> {
    fn push(&mut self, value: Value) {
        self.stacks.active_mut().push(value);
    }

    fn pop(&mut self) -> Result<Value, FaultKind> {
        Ok(self.stacks.active_mut().pop()?)
    }

    /// Pop a row, then a column, and require the cell to exist.
    fn pop_target(&mut self) -> Result<(i64, i64), FaultKind> {
        let row = self.pop()?.truncate();
        let col = self.pop()?.truncate();
        if !self.codebox.contains(row, col) {
            return Err(FaultKind::OutOfRange { row, col });
        }
        Ok((row, col))
    }
}

fn hex_digit(c: char) -> Option<i64> {
    match c {
        '0'..='9' | 'a'..='f' => c.to_digit(16).map(i64::from),
        _ => None,
    }
}

/// Instructions that still run in deep-sea mode.
fn movement(m: &mut Machine<'_>, instruction: char, ip: Pointer) -> Option<Pointer> {
    if let Some(direction) = Direction::from_arrow(instruction) {
        return Some(ip.turned(direction));
    }
    if let Some(mirror) = Mirror::from_char(instruction) {
        return Some(ip.turned(ip.direction.reflect(mirror)));
    }
    match instruction {
        'x' => {
            let choices: Vec<Direction> = Direction::iter().collect();
            let pick = choices[m.rng.gen_range(0..choices.len())];
            Some(ip.turned(pick))
        }
        '`' => Some(ip.hooked_turn()),
        'O' => Some(Pointer {
            submerged: false,
            ..ip
        }),
        ' ' => Some(ip),
        _ => None,
    }
}

pub(crate) fn dispatch(m: &mut Machine<'_>, cell: Cell, ip: Pointer) -> Result<Step, FaultKind> {
    let instruction = cell.instruction();
    if let Some(quote) = ip.quote {
        if instruction == quote {
            return Ok(Step::at(Pointer { quote: None, ..ip }));
        }
        // same code `g` reports, so padding reads as 0 either way
        m.push(Value::Int(cell.code()));
        return Ok(Step::at(ip));
    }

    if let Some(next) = movement(m, instruction, ip) {
        return Ok(Step::at(next));
    }
    if ip.submerged {
        return Ok(Step::at(ip));
    }

    if let Some(digit) = hex_digit(instruction) {
        m.push(Value::Int(digit));
        return Ok(Step::at(ip));
    }
    if let Some(op) = BinaryOp::from_char(instruction) {
        let (lhs, rhs) = m.stacks.active_mut().pop_pair()?;
        m.push(arith(op, lhs, rhs)?);
        return Ok(Step::at(ip));
    }
    if let Some(op) = Comparison::from_char(instruction) {
        let (lhs, rhs) = m.stacks.active_mut().pop_pair()?;
        m.push(compare(op, lhs, rhs));
        return Ok(Step::at(ip));
    }

    match instruction {
        ';' => return Ok(Step::with_effect(ip, Effect::Halt)),
        '"' | '\'' => {
            return Ok(Step::at(Pointer {
                quote: Some(instruction),
                ..ip
            }))
        }
        'u' => {
            return Ok(Step::at(Pointer {
                submerged: true,
                ..ip
            }))
        }

        // Trampolines and jumps
        '!' => {
            return Ok(Step {
                skip: true,
                ..Step::at(ip)
            })
        }
        '?' => {
            let flag = m.pop()?;
            return Ok(Step {
                skip: flag.is_zero(),
                ..Step::at(ip)
            });
        }
        '.' => {
            let (row, col) = m.pop_target()?;
            return Ok(Step::at(ip.moved_to(row, col)));
        }
        'C' => {
            if m.calls.len() >= MAX_CALL_DEPTH {
                return Err(FaultKind::CallDepthExceeded(MAX_CALL_DEPTH));
            }
            let (row, col) = m.pop_target()?;
            m.calls.push((ip.row, ip.col));
            return Ok(Step::at(ip.moved_to(row, col)));
        }
        'R' => {
            let (row, col) = m.calls.pop().ok_or(FaultKind::ReturnWithoutCall)?;
            return Ok(Step::at(ip.moved_to(row, col)));
        }

        // Stack manipulation
        ':' => m.stacks.active_mut().duplicate()?,
        '~' => {
            m.pop()?;
        }
        '$' => m.stacks.active_mut().swap_two()?,
        '@' => m.stacks.active_mut().rotate_three()?,
        '{' => m.stacks.active_mut().shift_left()?,
        '}' => m.stacks.active_mut().shift_right()?,
        'r' => m.stacks.active_mut().reverse(),
        'l' => {
            let len = m.stacks.active().len() as i64;
            m.push(Value::Int(len));
        }
        '[' => {
            let count = m.pop()?;
            let n = usize::try_from(count.truncate())
                .map_err(|_| FaultKind::InvalidOperand(count))?;
            m.stacks.push_frame(n, m.compatibility)?;
        }
        ']' => m.stacks.pop_frame(m.compatibility),
        '&' => m.stacks.toggle_register()?,

        // Reflection
        'g' => {
            let row = m.pop()?.truncate();
            let col = m.pop()?.truncate();
            let code = m.codebox.get(row, col).code();
            m.push(Value::Int(code));
        }
        'p' => {
            let row = m.pop()?.truncate();
            let col = m.pop()?.truncate();
            let value = m.pop()?;
            let cell = if value.is_zero() {
                Cell::Empty
            } else {
                Cell::Char(value.as_char().ok_or(FaultKind::InvalidCharacter(value))?)
            };
            m.codebox.set(row, col, cell)?;
        }

        // I/O
        'o' => {
            let value = m.pop()?;
            let c = value.as_char().ok_or(FaultKind::InvalidCharacter(value))?;
            return Ok(Step::with_effect(ip, Effect::Output(c.to_string())));
        }
        'n' => {
            let value = m.pop()?;
            return Ok(Step::with_effect(ip, Effect::Output(value.to_string())));
        }
        'i' => {
            let byte = m
                .input
                .read_byte()
                .map_err(|e| FaultKind::InputFailed(e.to_string()))?;
            m.push(Value::Int(byte.map(i64::from).unwrap_or(-1)));
        }

        // Time
        'h' => {
            let hour = m.clock.now().hour;
            m.push(Value::Int(hour.into()));
        }
        'm' => {
            let minute = m.clock.now().minute;
            m.push(Value::Int(minute.into()));
        }
        's' => {
            let second = m.clock.now().second;
            m.push(Value::Int(second.into()));
        }
        'S' => {
            let tenths = m.pop()?;
            let millis = tenths.as_float() * 100.0;
            if !(millis >= 0.0 && millis.is_finite()) {
                return Err(FaultKind::InvalidOperand(tenths));
            }
            let pause = Duration::from_millis(millis as u64);
            return Ok(Step::with_effect(ip, Effect::Pause(pause)));
        }

        _ => return Err(FaultKind::InvalidInstruction),
    }
    Ok(Step::at(ip))
}
