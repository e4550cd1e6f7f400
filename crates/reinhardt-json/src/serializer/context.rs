//! Per-call serialization state
//!
//! Tracks the identities of the aggregates currently being written, so that
//! a node reached again through its own descendants is recognised as a
//! cycle, and the nesting depth used for indentation.

use std::collections::HashSet;

/// Context for tracking nesting depth and the aggregates on the current path
#[derive(Debug, Default)]
pub struct SerializationContext {
	/// Current depth level (0 = root)
	current_depth: usize,
	/// Identities of the aggregates on the path from the root
	visited: HashSet<usize>,
}

impl SerializationContext {
	/// Create a new serialization context
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the current depth
	pub fn current_depth(&self) -> usize {
		self.current_depth
	}

	/// Enter an aggregate, marking it as visited for cycle detection
	///
	/// Returns `true` if the aggregate can be entered, `false` if it is
	/// already on the current path.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_json::serializer::SerializationContext;
	///
	/// let mut context = SerializationContext::new();
	/// assert!(context.enter(0x10));
	/// assert!(!context.enter(0x10));
	/// context.leave(0x10);
	/// assert!(context.enter(0x10));
	/// ```
	pub fn enter(&mut self, identity: usize) -> bool {
		if !self.visited.insert(identity) {
			return false;
		}
		self.current_depth += 1;
		true
	}

	/// Leave an aggregate, unmarking it (for backtracking)
	pub fn leave(&mut self, identity: usize) {
		if self.visited.remove(&identity) {
			self.current_depth = self.current_depth.saturating_sub(1);
		}
	}

	/// Whether an aggregate is on the current path
	pub fn is_visiting(&self, identity: usize) -> bool {
		self.visited.contains(&identity)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_depth_follows_path() {
		// Arrange
		let mut context = SerializationContext::new();

		// Act
		context.enter(1);
		context.enter(2);
		let nested = context.current_depth();
		context.leave(2);

		// Assert
		assert_eq!(nested, 2);
		assert_eq!(context.current_depth(), 1);
		assert!(context.is_visiting(1));
		assert!(!context.is_visiting(2));
	}

	#[rstest]
	fn test_reentry_does_not_change_depth() {
		let mut context = SerializationContext::new();
		context.enter(7);

		assert!(!context.enter(7));
		assert_eq!(context.current_depth(), 1);

		context.leave(9);
		assert_eq!(context.current_depth(), 1);
	}
}
