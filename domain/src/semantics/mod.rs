//! Typed semantic layer — questions, answers, propositions, plans, and
//! dialogue moves (including ICM grounding moves).
//!
//! All values here are plain data: deep-cloneable, structurally comparable,
//! and serializable to the stable JSON wire form. Dynamic `content` slots
//! use the [`ContentValue`](content::ContentValue) tagged union instead of
//! an untyped payload.

pub mod answer;
pub mod content;
pub mod dialogue_move;
pub mod grounding;
pub mod plan;
pub mod proposition;
pub mod question;
