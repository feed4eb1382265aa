// src/exam/mod.rs

//! Attempt assembly and scoring engine.
//!
//! Everything here takes the database pool as an explicit argument; there is
//! no process-wide session.

pub mod assembler;
pub mod error;
pub mod letters;
pub mod lifecycle;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod timer;

pub use assembler::create_attempt;
pub use error::ExamError;
pub use lifecycle::{AttemptStatus, check_question, record_selection, submit_attempt};
pub use scoring::evaluate_attempt;
pub use selection::{Candidate, CandidatePool, SelectionStrategy};
pub use session::ExamSession;
