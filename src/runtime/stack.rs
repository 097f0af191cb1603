//! VM operand stack and frame chain

use super::{CallFrame, RuntimeError, Value, ValueType};
use std::fmt;

/// The VM's operand stack plus its chain of active call frames
///
/// Operands pushed by a frame sit above that frame's `value_base`; popping
/// below it is an underflow even if outer frames still have values.
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
    frames: Vec<CallFrame>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Stack {
            values: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Push multiple values onto the stack
    pub fn push_all(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    /// Pop a value from the current frame's segment
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.value_num() == 0 {
            return Err(RuntimeError::StackUnderflow);
        }
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pop a value and check its type
    pub fn pop_typed(&mut self, expected_type: ValueType) -> Result<Value, RuntimeError> {
        let value = self.peek().ok_or(RuntimeError::StackUnderflow)?;
        check_type(value, expected_type)?;
        self.pop()
    }

    /// Pop an i32 value
    pub fn pop_i32(&mut self) -> Result<i32, RuntimeError> {
        self.pop_typed(ValueType::I32)?
            .as_i32()
            .ok_or(RuntimeError::TypeMismatch {
                expected: "i32".to_string(),
                actual: "non-i32".to_string(),
            })
    }

    /// Read the top `count` operands as i32 arguments without removing them
    ///
    /// The result is in push order: the deepest operand is argument 0 and the
    /// last-pushed operand is the final argument. Fails with `StackUnderflow`
    /// when the current frame holds fewer than `count` operands and with
    /// `TypeMismatch` when any of them is not an i32. The stack is unchanged
    /// either way.
    pub fn peek_i32_args(&self, count: usize) -> Result<Vec<i32>, RuntimeError> {
        if self.value_num() < count {
            return Err(RuntimeError::StackUnderflow);
        }
        let start = self.values.len() - count;
        // Checked in pop order, last-pushed first
        for value in self.values[start..].iter().rev() {
            check_type(value, ValueType::I32)?;
        }
        Ok(self.values[start..].iter().filter_map(Value::as_i32).collect())
    }

    /// Drop the top `count` operands of the current frame
    pub fn discard(&mut self, count: usize) -> Result<(), RuntimeError> {
        if self.value_num() < count {
            return Err(RuntimeError::StackUnderflow);
        }
        let new_len = self.values.len() - count;
        self.values.truncate(new_len);
        Ok(())
    }

    /// Get the current stack depth across all frames
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    /// Number of operands available to the current frame
    pub fn value_num(&self) -> usize {
        let base = self.frames.last().map_or(0, |frame| frame.value_base);
        self.values.len().saturating_sub(base)
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Peek at the top value without popping
    pub fn peek(&self) -> Option<&Value> {
        if self.value_num() == 0 {
            return None;
        }
        self.values.last()
    }

    /// Enter a call: the frame's segment starts at the current height
    pub fn push_frame(&mut self, mut frame: CallFrame) {
        frame.value_base = self.values.len();
        self.frames.push(frame);
    }

    /// Leave the current call
    ///
    /// Operands the frame left behind stay on the stack as its results.
    pub fn pop_frame(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// The innermost active frame
    pub fn current_frame(&self) -> Result<&CallFrame, RuntimeError> {
        self.frames.last().ok_or(RuntimeError::NoFrame)
    }

    /// Number of active frames
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Capture the stack state for diagnostics
    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            values: self.values.clone(),
            frame_depth: self.frames.len(),
        }
    }
}

fn check_type(value: &Value, expected: ValueType) -> Result<(), RuntimeError> {
    if value.typ() != expected {
        return Err(RuntimeError::TypeMismatch {
            expected: expected.to_string(),
            actual: value.typ().to_string(),
        });
    }
    Ok(())
}

/// Stack state captured at the point a failure was raised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackSnapshot {
    /// All operands, bottom first
    pub values: Vec<Value>,
    /// Number of active call frames
    pub frame_depth: usize,
}

impl fmt::Display for StackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "] in {} frame(s)", self.frame_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ModuleInstance;
    use std::rc::Rc;

    fn frame() -> CallFrame {
        CallFrame::new(Rc::new(ModuleInstance::new("test", vec![])), 0, vec![])
    }

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();

        stack.push(Value::I32(42));
        stack.push(Value::I64(100));

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap(), Value::I64(100));
        assert_eq!(stack.pop().unwrap(), Value::I32(42));
        assert_eq!(stack.pop(), Err(RuntimeError::StackUnderflow));
    }

    #[test]
    fn test_push_all() {
        let mut stack = Stack::new();
        stack.push_all(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.pop().unwrap(), Value::I32(3));
    }

    #[test]
    fn test_pop_typed() {
        let mut stack = Stack::new();
        stack.push(Value::I32(42));
        assert_eq!(stack.pop_typed(ValueType::I32).unwrap(), Value::I32(42));

        // Wrong type leaves the value in place
        stack.push(Value::F64(1.0));
        assert!(matches!(
            stack.pop_typed(ValueType::I32),
            Err(RuntimeError::TypeMismatch { .. })
        ));
        assert_eq!(stack.depth(), 1);
        assert!(stack.pop_i32().is_err());
    }

    #[test]
    fn test_frame_segments() {
        let mut stack = Stack::new();
        stack.push(Value::I32(1));
        stack.push(Value::I32(2));

        stack.push_frame(frame());
        assert_eq!(stack.value_num(), 0);
        assert_eq!(stack.depth(), 2);
        assert!(stack.peek().is_none());
        assert_eq!(stack.pop(), Err(RuntimeError::StackUnderflow));

        stack.push(Value::I32(3));
        assert_eq!(stack.value_num(), 1);
        assert_eq!(stack.pop_i32().unwrap(), 3);

        assert!(stack.pop_frame().is_some());
        assert_eq!(stack.value_num(), 2);
        assert_eq!(stack.pop_i32().unwrap(), 2);
    }

    #[test]
    fn test_current_frame() {
        let mut stack = Stack::new();
        assert_eq!(stack.current_frame().unwrap_err(), RuntimeError::NoFrame);

        stack.push(Value::I32(9));
        stack.push_frame(frame());
        let current = stack.current_frame().unwrap();
        assert_eq!(current.value_base, 1);
        assert_eq!(current.module.name(), "test");
        assert_eq!(stack.frame_depth(), 1);
    }

    #[test]
    fn test_peek_i32_args_order() {
        let mut stack = Stack::new();
        stack.push_all(vec![Value::I32(10), Value::I32(20), Value::I32(30)]);

        assert_eq!(stack.peek_i32_args(2).unwrap(), vec![20, 30]);
        assert_eq!(stack.peek_i32_args(3).unwrap(), vec![10, 20, 30]);
        assert_eq!(stack.peek_i32_args(0).unwrap(), Vec::<i32>::new());
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_peek_i32_args_failures_leave_stack() {
        let mut stack = Stack::new();
        stack.push(Value::I32(1));
        stack.push(Value::F32(2.0));

        assert_eq!(stack.peek_i32_args(3), Err(RuntimeError::StackUnderflow));
        assert_eq!(
            stack.peek_i32_args(2),
            Err(RuntimeError::TypeMismatch {
                expected: "i32".to_string(),
                actual: "f32".to_string(),
            })
        );
        assert_eq!(stack.snapshot().values, vec![Value::I32(1), Value::F32(2.0)]);
    }

    #[test]
    fn test_discard() {
        let mut stack = Stack::new();
        stack.push_all(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        stack.discard(2).unwrap();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.discard(2), Err(RuntimeError::StackUnderflow));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_snapshot_display() {
        let mut stack = Stack::new();
        stack.push_frame(frame());
        stack.push(Value::I32(7));
        stack.push(Value::I64(-1));
        assert_eq!(stack.snapshot().to_string(), "[i32:7, i64:-1] in 1 frame(s)");
    }
}
