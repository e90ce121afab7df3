//! Grounded question answering.
//!
//! Builds a grounding prompt from retrieved chunks, invokes the generative
//! model, and surfaces two independent confidence signals per answer.

mod engine;
mod verdict;

pub use engine::{AnswerEngine, GroundedAnswer, NO_DOCUMENTS_ANSWER};
pub use verdict::{parse_verdict, Verdict};
