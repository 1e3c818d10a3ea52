//! Instruction execution handlers, one module per instruction family

mod arithmetic;
mod control;
mod memory;
mod output;
mod radar;
mod sensing;
mod units;
