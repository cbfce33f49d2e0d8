pub mod app_state;

pub use app_state::{Alert, AppState, CopyFeedback, Presentation};
pub use hit_test::{HitTarget, HitTestIndex};
