//! Waiting queue and admission policy

pub mod admission;
pub mod queue;
