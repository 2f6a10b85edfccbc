pub mod db;
pub mod period;
pub mod server;
pub mod web;
