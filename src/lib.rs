pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod hook;
pub mod i18n;
pub mod platform;
pub mod preferences;
pub mod provider;
pub mod relay;
pub mod retry;
pub mod security;
