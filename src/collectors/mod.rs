pub mod poller;

pub use poller::{poll_and_commit, should_poll, PollContext, PollReport, Poller};
