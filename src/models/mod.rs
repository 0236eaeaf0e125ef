pub mod personal_best;
pub mod program;
pub mod settings;

pub use personal_best::PersonalBestLift;
pub use program::{Block, Day, DayPlan, DayType, ImportedBlock, ImportedWeek, Plan, Workout};
pub use settings::{WeightUnit, KG_TO_LBS};
