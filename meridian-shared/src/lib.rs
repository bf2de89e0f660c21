pub mod models;
pub mod money;

pub use models::sector::{ParseEnumError, Sector};
pub use money::{percentage_of, round_cents};
