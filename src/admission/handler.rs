// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Operation filter shared by admission plugins.

use super::interfaces::{Interface, Operation, ALL_OPERATIONS};

/// Handler answers [`Interface::handles`] for a fixed set of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    // Indexed by position in ALL_OPERATIONS.
    handled: [bool; ALL_OPERATIONS.len()],
}

impl Handler {
    /// Create a Handler for `operations`. Duplicates are ignored.
    pub fn new(operations: &[Operation]) -> Self {
        let mut handled = [false; ALL_OPERATIONS.len()];
        for (slot, op) in handled.iter_mut().zip(ALL_OPERATIONS) {
            *slot = operations.contains(&op);
        }
        Self { handled }
    }

    /// The handled operations, in CREATE, UPDATE, DELETE, CONNECT order.
    pub fn operations(&self) -> Vec<Operation> {
        ALL_OPERATIONS
            .into_iter()
            .zip(self.handled)
            .filter_map(|(op, handled)| handled.then_some(op))
            .collect()
    }
}

impl Interface for Handler {
    fn handles(&self, operation: Operation) -> bool {
        ALL_OPERATIONS
            .iter()
            .position(|op| *op == operation)
            .is_some_and(|i| self.handled[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_create_only() {
        let handler = Handler::new(&[Operation::Create]);
        assert!(handler.handles(Operation::Create));
        assert!(!handler.handles(Operation::Update));
        assert!(!handler.handles(Operation::Delete));
        assert!(!handler.handles(Operation::Connect));
        assert_eq!(handler.operations(), vec![Operation::Create]);
    }

    #[test]
    fn test_handler_all_operations() {
        let handler = Handler::new(&ALL_OPERATIONS);
        assert_eq!(handler.operations(), ALL_OPERATIONS.to_vec());
        for op in ALL_OPERATIONS {
            assert!(handler.handles(op));
        }
    }

    #[test]
    fn test_handler_normalizes_order_and_duplicates() {
        let handler = Handler::new(&[Operation::Connect, Operation::Create, Operation::Connect]);
        assert_eq!(handler.operations(), vec![Operation::Create, Operation::Connect]);
    }

    #[test]
    fn test_handler_empty() {
        let handler = Handler::new(&[]);
        assert!(handler.operations().is_empty());
        assert!(!handler.handles(Operation::Create));
    }
}
