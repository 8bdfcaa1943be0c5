pub mod coerce;
pub mod criteria;
pub mod error;
pub mod item;
pub mod normalize;
pub mod ranking;
pub mod weights;

pub use coerce::*;
pub use criteria::*;
pub use error::RankError;
pub use item::*;
pub use normalize::*;
pub use ranking::*;
pub use weights::*;
