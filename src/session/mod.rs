// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Sessions, their builders and execution results

mod builder;
pub mod options;
mod result;
mod session;

pub use builder::{Builder, Configure, Mutator};
pub use options::SessionOption;
pub use result::FetchResult;
pub use session::Session;
