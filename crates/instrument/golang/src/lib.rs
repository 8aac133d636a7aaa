//! Go support for instrumented decorators.
//!
//! Reads Go packages far enough to recover interface declarations and the
//! method sets of the types they mention, then renders decorator source for
//! the plans produced by `instrument-core`:
//!
//! - [`lexer`] / [`parser`]: declaration-level Go parsing
//! - [`loader`]: package directories, `go.mod` discovery, a small prelude
//! - [`toolchain`]: `$GOROOT` and the module cache, for dependencies
//! - [`resolve`]: qualified types with capability sets
//! - [`emit`]: Go source for decorator structs, constructors and methods
//! - [`generate`] / [`output`]: a whole run, rendered in memory then written

pub mod ast;
pub mod emit;
pub mod error;
pub mod generate;
pub mod lexer;
pub mod loader;
pub mod module;
pub mod output;
pub mod parser;
pub mod prelude;
pub mod resolve;
pub mod token;
pub mod toolchain;

pub use emit::Reporter;
pub use error::{GoError, Result, SyntaxError};
pub use generate::{GenerateOptions, OutputFile, generate};
pub use output::write_outputs;
pub use toolchain::GoEnv;
