//! RPN Operator System
//!
//! Provides the pieces operator bodies are written against:
//! - `OperatorDescriptor`: name, fixed arity, kind and typed handler
//! - `OperatorRegistry`: name and alias lookup, similar-name suggestions
//! - `dispatch`: broadcast, zip and Cartesian-product application
//! - `EvaluationContext` / `OperatorContext`: mutable and read-only state

mod context;
mod descriptor;
pub mod dispatch;
mod registry;

pub use context::{
    EvaluationContext, EvaluationState, FactorCache, FunctionApplier, InterruptFlag, NoFunctions,
    OperatorContext,
};
pub use descriptor::{
    BinaryFn, Handler, ListFn, ModifierFn, NullaryFn, OperatorDescriptor, OperatorKind, QuaternaryFn,
    QuinaryFn, TernaryFn, UnaryFn,
};
pub use registry::OperatorRegistry;

/// Re-export core types for operator authors
pub mod prelude {
    pub use crate::{
        EvaluationContext, FunctionApplier, Handler, OperatorContext, OperatorDescriptor, OperatorKind,
        OperatorRegistry,
    };
    pub use rpn_core::prelude::*;
}
