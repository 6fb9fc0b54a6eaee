//! Synthesis core: pitch table, waveform generators, envelope shapers and
//! the sequence renderer that stitches them into a WAV.
//!
//! Everything here is pure and deterministic. The same input always renders
//! to the same bytes.

pub mod envelope;
pub mod frequency;
pub mod oscillator;
pub mod renderer;
