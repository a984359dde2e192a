// src/lib.rs

//! Adaptive assessment engine: selects quizzes from a question pool, grades
//! attempts, tracks per-topic mastery and derives spaced-repetition study plans.
//!
//! The four engine operations ([`select`], [`analyze`], [`apply`], [`schedule`])
//! are plain functions over explicit inputs. Persistence and pool fetching live
//! at the edges in [`store`], [`repository`] and [`pool`]; [`pedagogy`] composes them.

pub mod analyzer;
pub mod constants;
pub mod database;
pub mod error;
pub mod models;
pub mod pedagogy;
pub mod pool;
pub mod progress;
pub mod repository;
pub mod scheduler;
pub mod selector;
pub mod store;

pub use analyzer::analyze;
pub use error::{EngineError, EngineResult};
pub use progress::apply;
pub use scheduler::schedule;
pub use selector::{select, DifficultyMix, Selection};
