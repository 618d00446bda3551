pub mod achievements;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod grader;
pub mod lbapi;
pub mod lbclient;
pub mod lbdb;
pub mod level;
pub mod models;
pub mod storage;
pub mod streak;
