pub mod command;
pub mod error;
pub mod naming;
pub mod types;

pub use command::{Clause, Command, ExecutionContext};
pub use error::{BodyError, CompileError};
pub use types::*;
