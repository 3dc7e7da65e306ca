mod log_store;
mod support;
