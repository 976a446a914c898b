//! Machine model tests: RAM, cache controller and store queues.

mod bus;
mod machine;
