//! Wrapper around the external text-to-video generation script.
//!
//! This crate provides:
//! - A registry of accepted model configs
//! - Deterministic command building for the generation script
//! - Blocking invocation with captured output
//! - Collection of generated files into artifacts

pub mod collect;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod invoker;
pub mod registry;

pub use collect::ArtifactCollector;
pub use command::{check_program, GenerationCommand, GenerationRunner};
pub use error::{GeneratorError, GeneratorResult};
pub use invoker::{Invoker, InvokerSettings, PROMPTS_FILE_NAME};
pub use registry::{ModelRegistry, ResolvedModel};
