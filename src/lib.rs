//! # Timetable Bot
//!
//! A Telegram bot that answers university class-schedule questions for
//! students and teachers.
//!
//! ## Features
//! - Look up a group or lecturer schedule for today, tomorrow, this week or next
//! - Remembers each chat's group or teacher and display preferences
//! - Daily subscription pushes at a chosen time
//! - Persistent storage with SQLite

/// Conversation state machine, keyboards, and update handlers
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Outbound message splitting and Telegram delivery
pub mod delivery;
/// Remote schedule directory client with caching
pub mod directory;
/// Background services like subscription pushes and health checks
pub mod services;
/// Schedule aggregation, day ranges, and text formatting
pub mod timetable;
