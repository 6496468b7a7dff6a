pub mod recommendation;
pub mod skill;
