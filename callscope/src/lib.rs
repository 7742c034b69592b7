pub mod config;
pub mod parser;
pub mod multiline;
pub mod headers;
pub mod classify;
pub mod tables;
pub mod extract;
pub mod diameter;
pub mod model;
pub mod timeline;
pub mod participants;
pub mod rtp;
pub mod correlation;
pub mod anomaly;
pub mod temporal;
pub mod bye;
pub mod sdp;
pub mod routing;
pub mod charging;
pub mod analysis;
pub mod export;
