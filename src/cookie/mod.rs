// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie handling
//!
//! - [`Jar`]: lenient jar that tokenizes cookie names
//! - [`MemoryStorage`]: RFC 6265 storage behind the jar
//! - [`CookieLoader`]: import of persisted browser cookies

mod jar;
mod loader;
mod mapping;
mod record;
mod storage;

pub use jar::{ErrorHandler, Jar, JarBuilder, JarError};
pub use loader::{CookieLoader, JsonCookieLoader, PersistedCookie};
pub use mapping::NameMapping;
pub use record::{Cookie, SameSite};
pub use storage::{is_valid_name, CookieStorage, MemoryStorage};
