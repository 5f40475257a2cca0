//! Combat systems (FixedUpdate)

pub mod animation;
pub mod death;
pub mod feedback;
pub mod melee;
pub mod motion;
pub mod projectile;

// Re-export all systems
pub use animation::*;
pub use death::*;
pub use feedback::*;
pub use melee::*;
pub use motion::*;
pub use projectile::*;
