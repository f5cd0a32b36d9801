pub mod holiday_cache;
