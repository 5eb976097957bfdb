//! Agent runtime - free-text routing over warehouse capabilities
//!
//! This crate is the boundary between free-text requests and the
//! deterministic warehouse operations:
//! - **Directive parsing** (`directives`) - explicit commands resolve
//!   without any model call
//! - **Capability registry** (`tools`) - the only coupling point between
//!   the reasoning collaborator and the core operations
//! - **LLM selection** (`llm`, `runtime`) - the model picks a capability
//!   from the catalog and echoes its argument
//!
//! # Safety Principle
//!
//! The LLM is strictly a router. It NEVER decides restock approvals,
//! prices, or thresholds. Those are deterministic decisions made by the
//! core gate and scoring functions.

pub mod directives;
pub mod llm;
pub mod runtime;
pub mod tools;
