pub mod app_state;
pub mod error;
pub mod history;
pub mod history_memory_store;
pub mod history_rest_store;
pub mod io_struct;
pub mod model_cache;
pub mod predictor;
pub mod preprocess;
pub mod server;
