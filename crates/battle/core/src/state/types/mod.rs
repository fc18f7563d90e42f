pub mod attack;
pub mod common;
pub mod status;
pub mod turn;
pub mod unit;

pub use attack::{AttackClass, AttackReach, AttackSource, AttackSpec, ClassWards, SourceWards};
pub use common::{ObjectCategory, ObjectId, Side};
pub use status::{ExtendedStatusFlags, StatusFlags};
pub use turn::{RoundPhase, TurnEntry, TurnQueue};
pub use unit::{ModifiedUnit, UnitRecord};
