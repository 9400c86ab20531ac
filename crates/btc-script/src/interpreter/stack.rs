//! Script execution stack.

use super::error::{ErrorKind, InterpreterError};
use super::limits::MAX_SCRIPT_NUMBER_LENGTH;
use super::scriptnum::ScriptNumber;

/// Convert a byte array to a boolean under consensus rules.
///
/// Any nonzero byte makes the value true, except that a trailing 0x80
/// alone (negative zero) is false.
pub fn cast_to_bool(bytes: &[u8]) -> bool {
    for (i, &b) in bytes.iter().enumerate() {
        if b != 0 {
            if i == bytes.len() - 1 && b == 0x80 {
                return false;
            }
            return true;
        }
    }
    false
}

/// Convert a boolean to its canonical stack encoding.
pub fn encode_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

/// A data stack of byte-string items. The same type backs the alt
/// stack, which reports its own underflow kind.
pub struct Stack {
    items: Vec<Vec<u8>>,
    require_minimal: bool,
    underflow: ErrorKind,
}

impl Stack {
    /// Create the main data stack.
    pub fn new(require_minimal: bool) -> Self {
        Stack {
            items: Vec::new(),
            require_minimal,
            underflow: ErrorKind::InvalidStackOperation,
        }
    }

    /// Create the alt stack (distinct underflow verdict).
    pub fn new_alt(require_minimal: bool) -> Self {
        Stack {
            items: Vec::new(),
            require_minimal,
            underflow: ErrorKind::InvalidAltStackOperation,
        }
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn push_byte_array(&mut self, data: Vec<u8>) {
        self.items.push(data);
    }

    pub fn push_int(&mut self, n: &ScriptNumber) {
        self.push_byte_array(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push_byte_array(encode_bool(val));
    }

    pub fn pop_byte_array(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.nip_n(0)
    }

    pub fn pop_int(&mut self) -> Result<ScriptNumber, InterpreterError> {
        let data = self.pop_byte_array()?;
        ScriptNumber::from_bytes(&data, MAX_SCRIPT_NUMBER_LENGTH, self.require_minimal)
    }

    pub fn pop_bool(&mut self) -> Result<bool, InterpreterError> {
        let data = self.pop_byte_array()?;
        Ok(cast_to_bool(&data))
    }

    /// Return a copy of the item `idx` entries down from the top.
    pub fn peek_byte_array(&self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(InterpreterError::new(
                self.underflow,
                format!("index {} is invalid for stack size {}", idx, sz),
            ));
        }
        Ok(self.items[sz - idx - 1].clone())
    }

    pub fn peek_bool(&self, idx: usize) -> Result<bool, InterpreterError> {
        let data = self.peek_byte_array(idx)?;
        Ok(cast_to_bool(&data))
    }

    /// Remove and return the item `idx` entries down from the top.
    fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(InterpreterError::new(
                self.underflow,
                format!("index {} is invalid for stack size {}", idx, sz),
            ));
        }
        Ok(self.items.remove(sz - idx - 1))
    }

    /// Remove the item `idx` entries down from the top, discarding it.
    pub fn nip_n_discard(&mut self, idx: usize) -> Result<(), InterpreterError> {
        self.nip_n(idx)?;
        Ok(())
    }

    /// `... a b` -> `... b a b`
    pub fn tuck(&mut self) -> Result<(), InterpreterError> {
        let b = self.pop_byte_array()?;
        let a = self.pop_byte_array()?;
        self.push_byte_array(b.clone());
        self.push_byte_array(a);
        self.push_byte_array(b);
        Ok(())
    }

    /// Drop the top `n` items.
    pub fn drop_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        for _ in 0..n {
            self.pop_byte_array()?;
        }
        Ok(())
    }

    /// Duplicate the top `n` items preserving their order.
    pub fn dup_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        for _ in 0..n {
            let item = self.peek_byte_array(n - 1)?;
            self.push_byte_array(item);
        }
        Ok(())
    }

    /// Rotate the top `3n` items: the third group of `n` moves to the top.
    pub fn rot_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 3 * n - 1;
        for _ in 0..n {
            let item = self.nip_n(entry)?;
            self.push_byte_array(item);
        }
        Ok(())
    }

    /// Swap the top `n` items with the `n` items below them.
    pub fn swap_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let item = self.nip_n(entry)?;
            self.push_byte_array(item);
        }
        Ok(())
    }

    /// Copy the `n` items below the top `n` items onto the top.
    pub fn over_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let item = self.peek_byte_array(entry)?;
            self.push_byte_array(item);
        }
        Ok(())
    }

    /// Copy the item `n` entries down to the top (OP_PICK).
    pub fn pick_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let item = self.peek_byte_array(n)?;
        self.push_byte_array(item);
        Ok(())
    }

    /// Move the item `n` entries down to the top (OP_ROLL).
    pub fn roll_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let item = self.nip_n(n)?;
        self.push_byte_array(item);
        Ok(())
    }

    /// Get stack contents as an array (bottom to top).
    pub fn items(&self) -> Vec<Vec<u8>> {
        self.items.clone()
    }

    /// Replace stack contents (last = top).
    pub fn set_items(&mut self, items: Vec<Vec<u8>>) {
        self.items = items;
    }

    /// Clear all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_to_bool() {
        assert!(!cast_to_bool(&[]));
        assert!(!cast_to_bool(&[0x00]));
        assert!(!cast_to_bool(&[0x80])); // negative zero
        assert!(cast_to_bool(&[0x01]));
        assert!(cast_to_bool(&[0x00, 0x01]));
        assert!(!cast_to_bool(&[0x00, 0x00]));
        assert!(!cast_to_bool(&[0x00, 0x80])); // negative zero
        assert!(cast_to_bool(&[0x80, 0x00])); // 0x80 not in last position
    }

    #[test]
    fn test_stack_push_pop() {
        let mut s = Stack::new(false);
        s.push_byte_array(vec![1, 2, 3]);
        s.push_byte_array(vec![4, 5]);
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pop_byte_array().expect("non-empty"), vec![4, 5]);
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn test_stack_underflow_kinds() {
        let mut main = Stack::new(false);
        let err = main.pop_byte_array().expect_err("empty stack");
        assert_eq!(err.kind, ErrorKind::InvalidStackOperation);

        let mut alt = Stack::new_alt(false);
        let err = alt.pop_byte_array().expect_err("empty alt stack");
        assert_eq!(err.kind, ErrorKind::InvalidAltStackOperation);
    }

    #[test]
    fn test_stack_dup_n() {
        let mut s = Stack::new(false);
        s.push_byte_array(vec![1]);
        s.push_byte_array(vec![2]);
        s.dup_n(2).expect("enough items");
        assert_eq!(s.depth(), 4);
        assert_eq!(s.pop_byte_array().expect("item"), vec![2]);
        assert_eq!(s.pop_byte_array().expect("item"), vec![1]);
        assert_eq!(s.pop_byte_array().expect("item"), vec![2]);
        assert_eq!(s.pop_byte_array().expect("item"), vec![1]);
    }

    #[test]
    fn test_stack_swap_and_rot() {
        let mut s = Stack::new(false);
        for i in 1..=3u8 {
            s.push_byte_array(vec![i]);
        }
        // [1 2 3] rot -> [2 3 1]
        s.rot_n(1).expect("enough items");
        assert_eq!(s.items(), vec![vec![2], vec![3], vec![1]]);

        let mut s = Stack::new(false);
        s.push_byte_array(vec![1]);
        s.push_byte_array(vec![2]);
        s.swap_n(1).expect("enough items");
        assert_eq!(s.items(), vec![vec![2], vec![1]]);
    }

    #[test]
    fn test_stack_tuck_and_over() {
        let mut s = Stack::new(false);
        s.push_byte_array(vec![1]);
        s.push_byte_array(vec![2]);
        s.tuck().expect("enough items");
        assert_eq!(s.items(), vec![vec![2], vec![1], vec![2]]);

        let mut s = Stack::new(false);
        s.push_byte_array(vec![1]);
        s.push_byte_array(vec![2]);
        s.over_n(1).expect("enough items");
        assert_eq!(s.items(), vec![vec![1], vec![2], vec![1]]);
    }

    #[test]
    fn test_stack_pick_roll() {
        let mut s = Stack::new(false);
        for i in 1..=3u8 {
            s.push_byte_array(vec![i]);
        }
        s.pick_n(2).expect("in range");
        assert_eq!(s.items(), vec![vec![1], vec![2], vec![3], vec![1]]);

        let mut s = Stack::new(false);
        for i in 1..=3u8 {
            s.push_byte_array(vec![i]);
        }
        s.roll_n(2).expect("in range");
        assert_eq!(s.items(), vec![vec![2], vec![3], vec![1]]);
    }

    #[test]
    fn test_pop_int_respects_minimal_flag() {
        let mut strict = Stack::new(true);
        strict.push_byte_array(vec![0x01, 0x00]);
        assert!(strict.pop_int().is_err());

        let mut lax = Stack::new(false);
        lax.push_byte_array(vec![0x01, 0x00]);
        assert_eq!(lax.pop_int().expect("tolerated").value(), 1);
    }
}
