pub mod daily_record;
pub mod interval;
pub mod period;
pub mod provider;
pub mod site;
pub mod summary;
