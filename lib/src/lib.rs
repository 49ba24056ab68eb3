//! Generic, allocation-free building blocks shared by the dispatcher core.
#![no_std]

pub mod array_vec;
pub mod log;
pub mod ring;

pub use array_vec::ArrayVec;
pub use ring::BoundedRing;
