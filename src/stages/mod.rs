// src/stages/mod.rs
// The two sequential pipeline stages. Each takes a read-only view of the
// run state plus injected service handles and returns a `StageUpdate` delta.

pub mod collect;
pub mod write;
