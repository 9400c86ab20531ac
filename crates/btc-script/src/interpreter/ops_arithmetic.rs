//! Numeric opcodes.
//!
//! Operands decode from at most four bytes; results are range-checked
//! back into the 4-byte interval, so overflow is fatal at the producing
//! opcode.

use super::error::{ErrorKind, InterpreterError};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn op_unary_num(
        &mut self,
        f: impl FnOnce(i64) -> i64,
    ) -> Result<(), InterpreterError> {
        let a = self.dstack.pop_int()?.value();
        self.dstack.push_int(&ScriptNumber::checked(f(a))?);
        Ok(())
    }

    /// Pop two operands and push `f(first_pushed, second_pushed)`.
    pub(crate) fn op_binary_num(
        &mut self,
        f: impl FnOnce(i64, i64) -> i64,
    ) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?.value();
        let a = self.dstack.pop_int()?.value();
        self.dstack.push_int(&ScriptNumber::checked(f(a, b))?);
        Ok(())
    }

    pub(crate) fn op_numequalverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_binary_num(|a, b| i64::from(a == b))?;
        self.abstract_verify(pop, ErrorKind::NumEqualVerifyFailed)
    }

    /// `a min max` pushes 1 iff `min <= a < max`.
    pub(crate) fn op_within(&mut self) -> Result<(), InterpreterError> {
        let max = self.dstack.pop_int()?;
        let min = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        self.dstack.push_bool(min <= a && a < max);
        Ok(())
    }
}
