pub mod lookup;
pub mod quick_edit;
pub mod search;
pub mod task_ops;
pub mod view;
