//! Code table: byte value to bit code.
//!
//! Derived from a [`CodeTree`] by a single depth-first walk. Descending left
//! appends a `0`, descending right appends a `1`. The walk uses an explicit
//! stack, so trees built from heavily skewed histograms (which degenerate
//! towards a linked list) cannot exhaust the call stack.

use crate::error::{Error, Result};
use crate::tree::{CodeTree, NodeKind};

/// Longest code the 64-bit code register can hold.
pub const MAX_CODE_LEN: u32 = 64;

/// A single code: the low `len` bits of `bits`, most significant first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Code {
    /// Code bits, right-aligned.
    pub bits: u64,
    /// Number of bits; 0 means the byte has no code.
    pub len: u32,
}

impl Code {
    /// Whether `self` is a prefix of `other` (a code is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (other.bits >> (other.len - self.len)) == self.bits
    }
}

/// Flat byte-to-code mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Code; 256],
}

impl CodeTable {
    /// Walk `tree` and record each leaf's path.
    ///
    /// # Errors
    /// Returns `Error::CodeTooLong` if a leaf is deeper than [`MAX_CODE_LEN`].
    pub fn derive(tree: &CodeTree) -> Result<Self> {
        let mut codes = [Code::default(); 256];
        let Some(root) = tree.root() else {
            return Ok(Self { codes });
        };

        let mut stack = vec![(root, Code::default())];
        while let Some((index, path)) = stack.pop() {
            match tree.node(index).kind {
                NodeKind::Leaf { byte } => codes[byte as usize] = path,
                NodeKind::Internal { left, right } => {
                    if path.len >= MAX_CODE_LEN {
                        return Err(Error::CodeTooLong {
                            length: path.len as usize + 1,
                        });
                    }
                    let len = path.len + 1;
                    stack.push((
                        right,
                        Code {
                            bits: (path.bits << 1) | 1,
                            len,
                        },
                    ));
                    stack.push((
                        left,
                        Code {
                            bits: path.bits << 1,
                            len,
                        },
                    ));
                }
            }
        }

        Ok(Self { codes })
    }

    /// Code for `byte`; `len == 0` if the byte is absent.
    #[inline]
    pub fn code(&self, byte: u8) -> Code {
        self.codes[byte as usize]
    }

    /// Code length for `byte`, 0 if absent.
    #[inline]
    pub fn len_of(&self, byte: u8) -> u32 {
        self.codes[byte as usize].len
    }

    /// `(byte, code)` for every byte that has a code, in byte order.
    pub fn entries(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len > 0)
            .map(|(b, &c)| (b as u8, c))
    }

    /// Whether no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let entries: Vec<(u8, Code)> = self.entries().collect();
        for (i, (_, a)) in entries.iter().enumerate() {
            for (_, b) in &entries[i + 1..] {
                if a.is_prefix_of(b) || b.is_prefix_of(a) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Histogram;
    use proptest::prelude::*;

    fn table_for(input: &[u8]) -> CodeTable {
        CodeTable::derive(&CodeTree::build(&Histogram::of(input))).unwrap()
    }

    #[test]
    fn test_worked_example_lengths() {
        let table = table_for(b"aaaabbbccd");
        assert_eq!(table.len_of(b'a'), 1);
        assert_eq!(table.len_of(b'b'), 2);
        assert_eq!(table.len_of(b'c'), 3);
        assert_eq!(table.len_of(b'd'), 3);
        assert_eq!(table.len_of(b'e'), 0);
        assert_eq!(table.code(b'a'), Code { bits: 0b0, len: 1 });
        assert_eq!(table.code(b'b'), Code { bits: 0b10, len: 2 });
        assert_eq!(table.code(b'd'), Code { bits: 0b110, len: 3 });
        assert_eq!(table.code(b'c'), Code { bits: 0b111, len: 3 });
    }

    #[test]
    fn test_single_symbol_one_bit() {
        let table = table_for(&[7u8; 100]);
        assert_eq!(table.code(7), Code { bits: 1, len: 1 });
        assert_eq!(table.code(0), Code { bits: 0, len: 1 });
    }

    #[test]
    fn test_empty_tree() {
        let table = CodeTable::derive(&CodeTree::default()).unwrap();
        assert_eq!(table.entries().count(), 0);
    }

    #[test]
    fn test_deep_tree_rejected() {
        // Fibonacci weights give a maximally skewed tree, one level per symbol.
        let mut fib = vec![1u64, 1];
        while fib.len() < 70 {
            let n = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(n);
        }
        let h = Histogram::from_pairs(fib.iter().enumerate().map(|(i, &w)| (i as u8, w)));
        let tree = CodeTree::build(&h);
        assert_eq!(tree.leaf_depths().iter().max(), Some(&69));
        assert!(matches!(
            CodeTable::derive(&tree),
            Err(Error::CodeTooLong { length: 65 })
        ));
    }

    #[test]
    fn test_depths_match_code_lengths() {
        let tree = CodeTree::build(&Histogram::of(b"the quick brown fox jumps"));
        let table = CodeTable::derive(&tree).unwrap();
        let depths = tree.leaf_depths();
        for b in 0..=255u8 {
            assert_eq!(depths[b as usize], table.len_of(b));
        }
    }

    proptest! {
        #[test]
        fn prop_codes_are_prefix_free(input in prop::collection::vec(any::<u8>(), 1..2000)) {
            let table = table_for(&input);
            prop_assert!(table.is_prefix_free());
            for &b in &input {
                prop_assert!(table.len_of(b) >= 1);
            }
        }
    }
}
