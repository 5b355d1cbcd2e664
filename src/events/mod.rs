//! # Events Module
//!
//! Structured progress events for the presentation layer.
//!
//! ## Design
//! The pipeline emits events through a channel; the CLI (or any other
//! front end) subscribes and renders progress however it likes. The core
//! never prints.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::File(FileEvent::Progress(p)) = event {
//!             println!("{}/{} {}", p.index, p.total, p.filename);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
