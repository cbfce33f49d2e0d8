pub mod client;
pub mod model;

pub use client::{Backend, BackendError, HttpBackend, ProcessResponse};
pub use model::{FormInput, Language, RewriteRequest, Tone, ValidationIssue};
