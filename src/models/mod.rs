pub mod application;
pub mod client;
pub mod enums;
pub mod lead;
pub mod listing;
pub mod process;
pub mod proposal;

pub use application::*;
pub use client::*;
pub use lead::*;
pub use listing::*;
pub use process::*;
pub use proposal::*;
