//! Turn orchestration for the English practice chat: sends each learner turn
//! to the tutoring backend, renders the reply, then fans out translation and
//! feedback requests whose results land on a pluggable render surface.

pub mod backend;
pub mod dispatch;
pub mod history;
pub mod render;
pub mod turn_loop;

#[cfg(test)]
mod testing;

pub use backend::{BackendError, HttpBackend, ScriptedBackend, TutorBackend};
pub use dispatch::{Command, parse_line};
pub use render::{Panel, RenderSurface};
pub use turn_loop::{Enrichment, HintRequester, SubmitGate, SubmitOutcome, TurnOrchestrator};
