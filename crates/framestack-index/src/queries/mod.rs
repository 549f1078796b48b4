pub mod anchor;
pub mod event;
pub mod frame;
pub mod project;
pub mod run;
pub mod trace;
