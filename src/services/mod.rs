pub mod api;
pub mod controller;
pub mod poller;
pub mod session;
