//! Value stacks and the stack-of-stacks.

use crate::values::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack underflow: needed {needed} value(s), found {available}")]
    Underflow { needed: usize, available: usize },
}

/// A LIFO stack of values. The top is the end of the backing vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bottom-to-top view of the contents.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn require(&self, needed: usize) -> Result<(), StackError> {
        if self.values.len() < needed {
            return Err(StackError::Underflow {
                needed,
                available: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.values.pop().ok_or(StackError::Underflow {
            needed: 1,
            available: 0,
        })
    }

    /// Pop two values, returning `(second_from_top, top)`.
    pub fn pop_pair(&mut self) -> Result<(Value, Value), StackError> {
        self.require(2)?;
        let top = self.pop()?;
        let below = self.pop()?;
        Ok((below, top))
    }

    pub fn peek(&self) -> Result<&Value, StackError> {
        self.values.last().ok_or(StackError::Underflow {
            needed: 1,
            available: 0,
        })
    }

    /// `:`
    pub fn duplicate(&mut self) -> Result<(), StackError> {
        let top = *self.peek()?;
        self.values.push(top);
        Ok(())
    }

    /// `$`
    pub fn swap_two(&mut self) -> Result<(), StackError> {
        self.require(2)?;
        let len = self.values.len();
        self.values.swap(len - 2, len - 1);
        Ok(())
    }

    /// `@`: the top value sinks two places, so `[1,2,3,4]` becomes `[1,4,2,3]`.
    pub fn rotate_three(&mut self) -> Result<(), StackError> {
        self.require(3)?;
        let len = self.values.len();
        self.values[len - 3..].rotate_right(1);
        Ok(())
    }

    /// `{`: the bottom value moves to the top.
    pub fn shift_left(&mut self) -> Result<(), StackError> {
        self.require(1)?;
        self.values.rotate_left(1);
        Ok(())
    }

    /// `}`: the top value moves to the bottom.
    pub fn shift_right(&mut self) -> Result<(), StackError> {
        self.require(1)?;
        self.values.rotate_right(1);
        Ok(())
    }

    /// `r`
    pub fn reverse(&mut self) {
        self.values.reverse();
    }

    /// Remove the top `count` values, keeping their bottom-to-top order.
    pub fn split_top(&mut self, count: usize) -> Result<Vec<Value>, StackError> {
        self.require(count)?;
        let at = self.values.len() - count;
        Ok(self.values.split_off(at))
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", items.join(", "))
    }
}

/// The stack-of-stacks. Never empty; the last frame is the active stack.
/// One register slot is shared by every frame.
#[derive(Debug, Clone)]
pub struct StackFrames {
    frames: Vec<Stack>,
    register: Option<Value>,
}

impl StackFrames {
    pub fn new(initial: Stack) -> Self {
        Self {
            frames: vec![initial],
            register: None,
        }
    }

    pub fn active(&self) -> &Stack {
        // frames is never empty
        &self.frames[self.frames.len() - 1]
    }

    pub fn active_mut(&mut self) -> &mut Stack {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bottom-to-top view of every frame.
    pub fn frames(&self) -> &[Stack] {
        &self.frames
    }

    pub fn register(&self) -> Option<Value> {
        self.register
    }

    /// `[`: move the top `count` values of the active stack into a new frame.
    pub fn push_frame(&mut self, count: usize, reversed: bool) -> Result<(), StackError> {
        let mut moved = self.active_mut().split_top(count)?;
        if reversed {
            moved.reverse();
        }
        self.frames.push(Stack::from_values(moved));
        Ok(())
    }

    /// `]`: fold the active frame back onto its parent. The bottom frame
    /// cannot be removed, so with a single frame this does nothing.
    pub fn pop_frame(&mut self, reversed: bool) {
        if self.frames.len() == 1 {
            return;
        }
        if let Some(closed) = self.frames.pop() {
            let mut values = closed.into_values();
            if reversed {
                values.reverse();
            }
            self.active_mut().extend(values);
        }
    }

    /// `&`: park the top value in the register, or push the parked value back.
    pub fn toggle_register(&mut self) -> Result<(), StackError> {
        match self.register.take() {
            Some(held) => self.active_mut().push(held),
            None => self.register = Some(self.active_mut().pop()?),
        }
        Ok(())
    }
}

impl Default for StackFrames {
    fn default() -> Self {
        Self::new(Stack::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Stack {
        Stack::from_values(values.iter().map(|&n| Value::Int(n)).collect())
    }

    #[test]
    fn swap_exchanges_top_two() {
        let mut s = ints(&[1, 2, 3]);
        s.swap_two().unwrap();
        assert_eq!(s, ints(&[1, 3, 2]));
    }

    #[test]
    fn rotate_sinks_top_value() {
        let mut s = ints(&[1, 2, 3, 4]);
        s.rotate_three().unwrap();
        assert_eq!(s, ints(&[1, 4, 2, 3]));
    }

    #[test]
    fn shifts_move_between_ends() {
        let mut s = ints(&[1, 2, 3]);
        s.shift_left().unwrap();
        assert_eq!(s, ints(&[2, 3, 1]));
        s.shift_right().unwrap();
        assert_eq!(s, ints(&[1, 2, 3]));
    }

    #[test]
    fn underflow_reports_counts() {
        let mut s = ints(&[1]);
        assert_eq!(
            s.rotate_three(),
            Err(StackError::Underflow {
                needed: 3,
                available: 1
            })
        );
        assert_eq!(s, ints(&[1]), "failed operation must not touch the stack");
        assert!(Stack::new().pop().is_err());
        assert!(Stack::new().shift_left().is_err());
    }

    #[test]
    fn pop_pair_orders_operands() {
        let mut s = ints(&[5, 2]);
        assert_eq!(s.pop_pair().unwrap(), (Value::Int(5), Value::Int(2)));
        assert!(s.is_empty());
    }

    #[test]
    fn frame_round_trip_restores_parent() {
        let mut frames = StackFrames::new(ints(&[9, 1, 2, 3]));
        frames.push_frame(3, false).unwrap();
        assert_eq!(frames.depth(), 2);
        assert_eq!(frames.active(), &ints(&[1, 2, 3]));
        frames.pop_frame(false);
        assert_eq!(frames.depth(), 1);
        assert_eq!(frames.active(), &ints(&[9, 1, 2, 3]));
    }

    #[test]
    fn reversed_frames_flip_both_ways() {
        let mut frames = StackFrames::new(ints(&[1, 2, 3]));
        frames.push_frame(2, true).unwrap();
        assert_eq!(frames.active(), &ints(&[3, 2]));
        frames.pop_frame(true);
        assert_eq!(frames.active(), &ints(&[1, 2, 3]));
    }

    #[test]
    fn closing_last_frame_is_noop() {
        let mut frames = StackFrames::new(ints(&[4]));
        frames.pop_frame(false);
        assert_eq!(frames.depth(), 1);
        assert_eq!(frames.active(), &ints(&[4]));
    }

    #[test]
    fn oversized_frame_request_underflows() {
        let mut frames = StackFrames::new(ints(&[1]));
        assert!(frames.push_frame(2, false).is_err());
        assert_eq!(frames.depth(), 1);
        assert_eq!(frames.active(), &ints(&[1]));
    }

    #[test]
    fn register_survives_frame_changes() {
        let mut frames = StackFrames::new(ints(&[7, 8]));
        frames.toggle_register().unwrap();
        assert_eq!(frames.register(), Some(Value::Int(8)));
        frames.push_frame(1, false).unwrap();
        frames.toggle_register().unwrap();
        assert_eq!(frames.register(), None);
        assert_eq!(frames.active(), &ints(&[7, 8]));
    }

    #[test]
    fn register_on_empty_stack_underflows() {
        let mut frames = StackFrames::default();
        assert!(frames.toggle_register().is_err());
        assert_eq!(frames.register(), None);
    }
}
