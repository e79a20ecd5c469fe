pub mod calendar;
pub mod dashboard;
pub mod habit_service;
pub mod record_service;
pub mod scheduler;
pub mod summary_service;
pub mod sync_service;

pub use calendar::CalendarService;
pub use dashboard::{Dashboard, DashboardService};
pub use habit_service::HabitService;
pub use record_service::RecordService;
pub use scheduler::{SnapshotRunStats, SnapshotScheduler};
pub use summary_service::SummaryService;
pub use sync_service::{SyncLocks, SyncResult, SyncService};
