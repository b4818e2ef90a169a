//! Terminal client for the EVA match-analytics server: a charts dashboard
//! over the shared dataset and a per-player coach with SHAP reports and chat.

pub mod coach_fetch;
pub mod dataset_fetch;
pub mod dataset_stats;
pub mod demo_feed;
pub mod feed;
pub mod http_client;
pub mod markdown;
pub mod plot_export;
pub mod reveal;
pub mod state;
