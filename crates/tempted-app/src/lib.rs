// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod formatter;
pub mod header;
pub mod keymap;
pub mod keys;
pub mod load;
pub mod message;
pub mod model;
pub mod page;
pub mod pages;
pub mod source;
pub mod state;

pub use header::*;
pub use keymap::{Key, KeyCode, KeyHelp};
pub use keys::*;
pub use load::*;
pub use message::*;
pub use model::*;
pub use page::*;
pub use pages::*;
pub use source::*;
pub use state::*;
