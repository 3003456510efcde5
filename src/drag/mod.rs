pub mod coordinator;
pub mod dispatch;

pub use coordinator::{DragCoordinator, DragGesture, DragPhase, DragState, DropTarget, RescheduleCommand, RescheduleSink};
pub use dispatch::{commit_reschedule, run_dispatcher};
