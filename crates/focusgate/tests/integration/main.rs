//! Integration tests for focusgate
//!
//! These tests spawn real processes and drive real interpreters.
//! Run with: cargo test -p focusgate --features integration-tests
//!
//! Tests for a language whose interpreter (python3, node, php, cc) is not
//! installed skip themselves at runtime.

#![cfg(feature = "integration-tests")]

use focusgate::Runner;

mod blocking;
mod c_execution;
mod javascript_execution;
mod php_execution;
mod python_execution;

/// Whether `name` resolves to an executable on PATH
pub(crate) fn has_program(name: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|path| {
        std::env::split_paths(&path).any(|dir| dir.join(name).is_file())
    })
}

pub(crate) fn runner() -> Runner {
    Runner::with_defaults()
}

/// Skip the calling test when `program` is unavailable
macro_rules! require_program {
    ($program:expr) => {
        if !crate::has_program($program) {
            eprintln!("skipping: {} not installed", $program);
            return;
        }
    };
}

pub(crate) use require_program;
