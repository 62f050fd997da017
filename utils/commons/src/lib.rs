//! Common types shared by the perpetual auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, constants::*, errors::*, types::*};
use concordium_std::*;

mod authority;
mod constants;
mod errors;
mod types;
