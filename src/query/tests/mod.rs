//! Unit tests for the query orchestration module.

mod domain_tests;
