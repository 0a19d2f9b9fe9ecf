#![deny(warnings)]
pub mod deck;
pub mod model;
