//! Property-based tests for the decision engine.
