pub mod detector;
pub mod event;
pub mod queue;
pub mod script;
pub mod step;
pub mod world;
