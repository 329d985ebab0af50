/*! # Hognet tests

Runs a host and its clients in one process, connected via crossbeam channels, to test whole
sessions end to end.
*/

extern crate alloc;

#[cfg(test)]
mod client_server;
pub mod stepper;
