// Entity model and current-snapshot store
pub mod state;

// Snapshot type and change detection
pub mod snapshot;

// Subscriber registry and fan-out
pub mod broadcast;

// Source extraction
pub mod extractor;

// Recurring poll loop
pub mod poller;

// HTTP and SSE APIs
pub mod api;

// Configuration loading
pub mod config;
