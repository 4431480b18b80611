//! End-to-end entity creation tests

mod map_loading;
