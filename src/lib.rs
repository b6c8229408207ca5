pub mod alerts;
pub mod conditions;
pub mod config;
pub mod diff;
pub mod error;
pub mod fixtures;
pub mod http_client;
pub mod match_data;
pub mod name_match;
pub mod odds_feed;
pub mod pipeline;
pub mod records;
pub mod report_export;
pub mod snapshot;
pub mod streak;
