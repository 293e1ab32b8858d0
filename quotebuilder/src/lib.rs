//! QuoteBuilder - account, profile and role administration behind an
//! OAuth2-style token endpoint.
//!
//! This library provides the core components for the QuoteBuilder server.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod repository;
pub mod service;
