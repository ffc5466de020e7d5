pub mod postgres_sink;
