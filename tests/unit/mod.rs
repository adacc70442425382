mod backpressure_tests;
mod deadlock_guard_tests;
mod engine_tests;
mod matching_tests;
mod snapshot_tests;
mod stop_order_tests;
mod time_in_force_tests;
mod worker_pool_tests;
