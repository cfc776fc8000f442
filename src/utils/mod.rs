pub mod batch_number_filter;
pub mod db_utils;
pub mod summary_cache;
