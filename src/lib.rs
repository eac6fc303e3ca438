#![warn(clippy::all, rust_2018_idioms)]

pub mod emulator;
