pub mod config;
pub mod db;
pub mod engine;
pub mod transport;
pub mod web;
