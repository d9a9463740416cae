//! Background generation for quill.
//!
//! A `std::thread` worker owns the [`Generator`](quill_core::generation::Generator)
//! for its lifetime. Jobs arrive over a crossbeam channel; chunks go back to the
//! UI loop as `AppEvent::Generation`, paced by the configured delay.
pub mod types;
pub mod worker;
