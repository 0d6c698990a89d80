// Pattern cascade - structural templates tried in a fixed order.
// - engine.rs: PatternCascade, the ExtractionPattern trait and shared regex fragments
// - placement.rs, ascendant.rs, aspect.rs, lordship.rs, nakshatra.rs, yoga.rs:
//   one template each, in cascade order

pub mod engine;
pub mod placement;
pub mod ascendant;
pub mod aspect;
pub mod lordship;
pub mod nakshatra;
pub mod yoga;

pub use engine::*;
