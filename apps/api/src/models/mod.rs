pub mod event;
pub mod page;
