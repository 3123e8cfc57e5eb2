//! Shared data model for the wagering engine.
//!
//! Everything a resolved round carries ([casino::WagerRound]) and the
//! vocabulary the execution crate uses to describe games, choices and
//! outcomes. Records implement `commonware_codec` so a history can be
//! exported, though no encoding here is an authoritative storage format.

pub mod casino;
