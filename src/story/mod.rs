//! Story state: the controller that keeps the story and its pages cached.

mod controller;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::StoryStateController;
