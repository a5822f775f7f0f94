//! Heirloom Storefront client library.
//!
//! Talks to the Heirloom REST backend and owns the client-side state of the
//! shop: the anonymous cart, pricing, the checkout flow and the signed-in
//! session. Front ends (the `heirloom` CLI, tests) drive it through
//! [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
