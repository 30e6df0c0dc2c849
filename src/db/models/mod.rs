mod course;
mod learner_profile;
mod user;

pub use course::*;
pub use learner_profile::*;
pub use user::*;
