pub mod coordinator;
mod worker;
