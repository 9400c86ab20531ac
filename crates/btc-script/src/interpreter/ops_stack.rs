//! Stack and alt-stack manipulation opcodes.

use super::error::{ErrorKind, InterpreterError};
use super::scriptnum::ScriptNumber;
use super::stack::cast_to_bool;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn op_to_alt_stack(&mut self) -> Result<(), InterpreterError> {
        let data = self.dstack.pop_byte_array()?;
        self.astack.push_byte_array(data);
        Ok(())
    }

    pub(crate) fn op_from_alt_stack(&mut self) -> Result<(), InterpreterError> {
        let data = self.astack.pop_byte_array()?;
        self.dstack.push_byte_array(data);
        Ok(())
    }

    pub(crate) fn op_ifdup(&mut self) -> Result<(), InterpreterError> {
        let top = self.dstack.peek_byte_array(0)?;
        if cast_to_bool(&top) {
            self.dstack.push_byte_array(top);
        }
        Ok(())
    }

    pub(crate) fn op_depth(&mut self) -> Result<(), InterpreterError> {
        let depth = self.dstack.depth();
        self.dstack.push_int(&ScriptNumber::new(depth as i64));
        Ok(())
    }

    /// Read the index operand for OP_PICK / OP_ROLL, validating the
    /// range `[0, depth - 1]` against the remaining stack.
    fn pop_stack_index(&mut self) -> Result<usize, InterpreterError> {
        let n = self.dstack.pop_int()?.value();
        if n < 0 || n as usize >= self.dstack.depth() {
            return Err(InterpreterError::new(
                ErrorKind::InvalidStackOperation,
                format!("index {} is invalid for stack size {}", n, self.dstack.depth()),
            ));
        }
        Ok(n as usize)
    }

    pub(crate) fn op_pick(&mut self) -> Result<(), InterpreterError> {
        let n = self.pop_stack_index()?;
        self.dstack.pick_n(n)
    }

    pub(crate) fn op_roll(&mut self) -> Result<(), InterpreterError> {
        let n = self.pop_stack_index()?;
        self.dstack.roll_n(n)
    }
}
