//! Domain layer - Pure business logic.

// Rendition ladder and resolution parsing
pub mod rendition;

// Video record and eligibility rules
pub mod video;
