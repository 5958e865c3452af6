pub mod contact_history;
pub mod customer;
pub mod deal;
pub mod organization;
pub mod pipeline;
pub mod task;
pub mod user;

pub use contact_history::{ContactHistory, ContactHistoryListQuery, ContactHistoryPatch, ContactType, NewContactHistory};
pub use customer::{Customer, CustomerListQuery, CustomerPatch, CustomerStatus, NewCustomer};
pub use deal::{Deal, DealListQuery, DealPatch, DealProduct, NewDeal};
pub use organization::{NewOrganization, Organization, SubscriptionTier};
pub use pipeline::{NewPipeline, Pipeline, Stage, StageError, StageList};
pub use task::{NewTask, Task, TaskListQuery, TaskPatch, TaskPriority, TaskStatus};
pub use user::{NewUser, User, UserRole};
