//! Domain layer: game types, draw records, cascade state and schedules.
//!
//! Everything here is pure data and pure functions. Storage, scraping and
//! HTTP live in the outer layers and only exchange these types.

pub mod cascade;
pub mod draw;
pub mod game;
pub mod run_id;
pub mod schedule;

pub use cascade::{CascadeInput, CascadeStatus};
pub use draw::{DrawPayload, DrawRecord, StoredDraw};
pub use game::{DrawSource, GameSelection, GameType};
pub use run_id::RunId;
pub use schedule::{ScheduleBook, ScheduleDefinition, SpecialRule};
